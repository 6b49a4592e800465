use std::time::Duration;

/// 宿主驱动的时钟。
///
/// 宿主每轮循环调用一次 `advance`，传入真实经过的时间。
/// 游戏时间受 `time_scale` 缩放，真实时间不受影响。
#[derive(Clone, Debug)]
pub struct Clock {
    game_time: f64,
    real_time: f64,
    time_scale: f64,
    delta: f64,
}

impl Clock {
    pub fn new(time_scale: f64) -> Self {
        Clock {
            game_time: 0.0,
            real_time: 0.0,
            time_scale: sanitize_scale(time_scale),
            delta: 0.0,
        }
    }

    pub fn advance(&mut self, real_delta: Duration) {
        let seconds = real_delta.as_secs_f64();
        self.real_time += seconds;
        self.delta = seconds * self.time_scale;
        self.game_time += self.delta;
    }

    /// 经过缩放的游戏时间（秒）。
    pub fn game_time(&self) -> f64 {
        self.game_time
    }

    /// 不受缩放影响的真实时间（秒）。
    pub fn real_time(&self) -> f64 {
        self.real_time
    }

    /// 最近一次 `advance` 的游戏时间增量。
    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    pub fn set_time_scale(&mut self, time_scale: f64) {
        self.time_scale = sanitize_scale(time_scale);
    }
}

impl Default for Clock {
    fn default() -> Self {
        Clock::new(1.0)
    }
}

fn sanitize_scale(time_scale: f64) -> f64 {
    if time_scale.is_finite() && time_scale >= 0.0 {
        time_scale
    } else {
        log::warn!("Invalid time scale {}, falling back to 0", time_scale);
        0.0
    }
}
