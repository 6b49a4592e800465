//! 演示协程。
//!
//! - `Blinker`：手写状态机，先协商阶段，再按游戏时间闪烁
//! - 倒计时：由停顿器迭代器构造
//! - 等待链：outer 等待 middle，middle 等待倒计时
//! - tokio 任务：通过 `WaitForTask` 桥接到协程
//! - 协程组：两个心跳协程，在组被丢弃时一起停止
//! - 输入模拟与角色检查

use std::{
    fmt::Display,
    sync::{Arc, Mutex},
    time::Duration,
};

use cadence_core::{
    from_fn, from_iter,
    stallers::{
        WaitForCoroutine, WaitForFrames, WaitForNextSimulate, WaitForPreferredPhase,
        WaitForSeconds, WaitForTask, WaitForTicks,
    },
    Coroutine, CoroutineBucket, CoroutineError, CoroutineHandle, Scheduler, Staller, Step,
    StepContext,
};
use colored::*;
use tokio::runtime::Runtime;

fn event(cx: &StepContext<'_>, name: &str, message: impl Display) {
    println!(
        "{} {} {} {}",
        format!("[{:>7.3}s]", cx.clock().game_time()).dimmed(),
        format!("{:<8}", cx.phase().as_str()).blue(),
        format!("{:<8}", name).cyan().bold(),
        message
    );
}

#[derive(Clone, Copy)]
enum BlinkState {
    Start,
    Blinking { remaining: u32, lit: bool },
    Finished,
}

/// 闪烁若干次，每次亮灭各持续 `period` 秒游戏时间。
pub struct Blinker {
    state: BlinkState,
    blinks: u32,
    period: f64,
}

impl Blinker {
    pub fn new(blinks: u32, period: f64) -> Self {
        Blinker {
            state: BlinkState::Start,
            blinks,
            period,
        }
    }
}

impl Coroutine for Blinker {
    fn resume(&mut self, cx: &StepContext<'_>) -> Result<Step, CoroutineError> {
        match self.state {
            BlinkState::Start => {
                self.state = BlinkState::Blinking {
                    remaining: self.blinks * 2,
                    lit: false,
                };
                // 之后的时间等待沿用协商出的阶段
                Ok(Step::stall(WaitForPreferredPhase::frame_or_tick(cx.role())))
            }
            BlinkState::Blinking { remaining: 0, .. } => {
                event(cx, "blinker", "done".green());
                self.state = BlinkState::Finished;
                Ok(Step::Done)
            }
            BlinkState::Blinking { remaining, lit } => {
                let lit = !lit;
                if lit {
                    event(cx, "blinker", "on".yellow());
                } else {
                    event(cx, "blinker", "off".dimmed());
                }
                self.state = BlinkState::Blinking {
                    remaining: remaining - 1,
                    lit,
                };
                Ok(Step::stall(WaitForSeconds::new(self.period, cx)))
            }
            BlinkState::Finished => Ok(Step::Done),
        }
    }

    fn format_context(&self) -> String {
        "blinker".to_string()
    }
}

fn countdown(from: i64) -> impl Coroutine {
    from_iter((1..=from).rev().map(|n| Box::new(WaitForTicks::new(n)) as Box<dyn Staller>))
}

fn waiter(name: &'static str, target: CoroutineHandle) -> impl Coroutine {
    let mut target = Some(target);
    from_fn(move |cx| match target.take() {
        Some(handle) => {
            event(cx, name, format!("waiting for #{}", handle.id()));
            Ok(Step::stall(WaitForCoroutine::new(handle)))
        }
        None => {
            event(cx, name, "resolved".green());
            Ok(Step::Done)
        }
    })
}

fn heartbeat(name: &'static str, every: i64) -> impl Coroutine {
    let mut beats = 0u32;
    from_fn(move |cx| {
        if beats > 0 {
            event(cx, name, format!("beat {}", beats));
        }
        beats += 1;
        Ok(Step::stall(WaitForTicks::new(every)))
    })
}

fn remote_fetch(runtime: &Runtime) -> impl Coroutine {
    let slot = Arc::new(Mutex::new(None));
    let writer = slot.clone();
    let mut task = Some(runtime.spawn(async move {
        tokio::time::sleep(Duration::from_millis(350)).await;
        if let Ok(mut value) = writer.lock() {
            *value = Some(42u64);
        }
    }));

    from_fn(move |cx| match task.take() {
        Some(task) => {
            event(cx, "fetch", "waiting for tokio task");
            Ok(Step::stall(WaitForTask::new(task, cx.role())))
        }
        None => {
            let value = slot.lock().ok().and_then(|value| *value);
            event(cx, "fetch", format!("task resolved with {:?}", value).green());
            Ok(Step::Done)
        }
    })
}

fn input_watcher(client: u64) -> impl Coroutine {
    let mut waited = false;
    from_fn(move |cx| {
        if waited {
            event(cx, "input", format!("client {} simulated", client).green());
            return Ok(Step::Done);
        }
        waited = true;
        Ok(Step::stall(WaitForNextSimulate::new(Some(client), true)))
    })
}

/// 在服务端角色下因渲染帧不可用而在加入时失败。
fn frame_probe() -> impl Coroutine {
    let mut probed = false;
    from_fn(move |cx| {
        if probed {
            event(cx, "probe", "frame observed".green());
            return Ok(Step::Done);
        }
        probed = true;
        Ok(Step::stall(WaitForFrames::next(cx.role())?))
    })
}

pub struct Demo {
    tracked: Vec<CoroutineHandle>,
    bucket: Option<CoroutineBucket>,
    bucket_lifetime: u64,
    // 桥接的任务需要运行时一直存活
    _runtime: Runtime,
}

impl Demo {
    pub fn start(scheduler: &Scheduler, runtime: Runtime) -> Self {
        let blinker = scheduler.start(|| Blinker::new(3, 0.2));
        let counter = scheduler.start_with(countdown, 3);
        let middle = scheduler.start_with(|target| waiter("middle", target), counter.clone());
        let outer = scheduler.start_with(|target| waiter("outer", target), middle.clone());
        let fetch = scheduler.start(|| remote_fetch(&runtime));
        let input = scheduler.start_with(input_watcher, 2);
        let probe = scheduler.start(frame_probe);

        let mut bucket = scheduler.bucket();
        bucket.start_with(|every| heartbeat("pulse-a", every), 2);
        bucket.start_with(|every| heartbeat("pulse-b", every), 3);

        Demo {
            tracked: vec![blinker, counter, middle, outer, fetch, input, probe],
            bucket: Some(bucket),
            bucket_lifetime: 8,
            _runtime: runtime,
        }
    }

    /// 每个 tick 之后调用，返回 false 表示演示已结束。
    pub fn after_tick(&mut self, tick: u64) -> bool {
        if tick >= self.bucket_lifetime {
            if let Some(bucket) = self.bucket.take() {
                println!(
                    "{}",
                    format!("dropping bucket with {} coroutines", bucket.len()).magenta()
                );
            }
        }
        !self.is_finished()
    }

    pub fn is_finished(&self) -> bool {
        self.bucket.is_none() && self.tracked.iter().all(CoroutineHandle::is_complete)
    }
}
