use crate::{
    context::StepContext,
    error::StallerError,
    phase::{HostRole, Phase, PhaseRequest},
    staller::{checked, Staller},
};

/// 等待指定的游戏时间（受时间缩放影响）。
///
/// 默认沿用协程当前阶段。
pub struct WaitForSeconds {
    target: f64,
    now: f64,
    phase: PhaseRequest,
}

impl WaitForSeconds {
    pub fn new(seconds: f64, cx: &StepContext<'_>) -> Self {
        let now = cx.clock().game_time();
        WaitForSeconds {
            target: now + seconds,
            now,
            phase: PhaseRequest::Preserve,
        }
    }

    pub fn on(mut self, phase: Phase, role: HostRole) -> Result<Self, StallerError> {
        self.phase = checked(phase, role)?;
        Ok(self)
    }

    pub fn remaining(&self) -> f64 {
        self.target - self.now
    }
}

impl Staller for WaitForSeconds {
    fn is_complete(&self) -> bool {
        self.remaining() <= 0.0
    }

    fn desired_phase(&self) -> &PhaseRequest {
        &self.phase
    }

    fn advance(&mut self, cx: &StepContext<'_>) {
        self.now = cx.clock().game_time();
    }

    fn describe(&self) -> String {
        format!("WaitForSeconds(remaining: {:.3}s)", self.remaining())
    }
}

/// 等待指定的真实时间，不受时间缩放影响。
///
/// 默认在 `Phase::TICK` 上检查。
pub struct WaitForRealSeconds {
    target: f64,
    now: f64,
    phase: PhaseRequest,
}

impl WaitForRealSeconds {
    pub fn new(seconds: f64, cx: &StepContext<'_>) -> Self {
        let now = cx.clock().real_time();
        WaitForRealSeconds {
            target: now + seconds,
            now,
            phase: PhaseRequest::On(Phase::TICK),
        }
    }

    pub fn on(mut self, phase: Phase, role: HostRole) -> Result<Self, StallerError> {
        self.phase = checked(phase, role)?;
        Ok(self)
    }

    pub fn remaining(&self) -> f64 {
        self.target - self.now
    }
}

impl Staller for WaitForRealSeconds {
    fn is_complete(&self) -> bool {
        self.remaining() <= 0.0
    }

    fn desired_phase(&self) -> &PhaseRequest {
        &self.phase
    }

    fn advance(&mut self, cx: &StepContext<'_>) {
        self.now = cx.clock().real_time();
    }

    fn describe(&self) -> String {
        format!("WaitForRealSeconds(remaining: {:.3}s)", self.remaining())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::Clock, scheduler::Spawner};
    use std::time::Duration;

    #[test]
    fn test_game_seconds_follow_time_scale() {
        let spawner = Spawner::new();
        let mut clock = Clock::new(0.5);
        let mut staller = {
            let cx = StepContext::new(&Phase::TICK, &clock, HostRole::Client, &spawner);
            WaitForSeconds::new(1.0, &cx)
        };
        assert_eq!(staller.desired_phase(), &PhaseRequest::Preserve);

        clock.advance(Duration::from_secs(1));
        staller.advance(&StepContext::new(&Phase::TICK, &clock, HostRole::Client, &spawner));
        assert!(!staller.is_complete());

        clock.advance(Duration::from_secs(1));
        staller.advance(&StepContext::new(&Phase::TICK, &clock, HostRole::Client, &spawner));
        assert!(staller.is_complete());
    }

    #[test]
    fn test_real_seconds_ignore_time_scale() {
        let spawner = Spawner::new();
        let mut clock = Clock::new(0.0);
        let mut staller = {
            let cx = StepContext::new(&Phase::TICK, &clock, HostRole::Client, &spawner);
            WaitForRealSeconds::new(1.5, &cx)
        };
        assert_eq!(staller.desired_phase(), &PhaseRequest::On(Phase::TICK));

        clock.advance(Duration::from_secs(1));
        staller.advance(&StepContext::new(&Phase::TICK, &clock, HostRole::Client, &spawner));
        assert!(!staller.is_complete());

        clock.advance(Duration::from_secs(1));
        staller.advance(&StepContext::new(&Phase::TICK, &clock, HostRole::Client, &spawner));
        assert!(staller.is_complete());
        assert_eq!(clock.game_time(), 0.0);
    }

    #[test]
    fn test_frame_phase_is_checked_against_role() {
        let spawner = Spawner::new();
        let clock = Clock::default();
        let cx = StepContext::new(&Phase::TICK, &clock, HostRole::Server, &spawner);

        assert!(WaitForSeconds::new(1.0, &cx)
            .on(Phase::FRAME, cx.role())
            .is_err());
        assert!(WaitForRealSeconds::new(1.0, &cx)
            .on(Phase::FRAME, cx.role())
            .is_err());
        assert!(WaitForSeconds::new(1.0, &cx)
            .on(Phase::TICK, cx.role())
            .is_ok());
    }
}
