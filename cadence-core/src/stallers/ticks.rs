use crate::{
    context::StepContext,
    phase::{Phase, PhaseRequest},
    staller::Staller,
};

/// 等待指定数量的 tick。
///
/// 每次在 `Phase::TICK` 上推进时计数减一，计数不大于 0 时完成。
pub struct WaitForTicks {
    remaining: i64,
    phase: PhaseRequest,
}

impl WaitForTicks {
    pub fn new(ticks: i64) -> Self {
        WaitForTicks {
            remaining: ticks,
            phase: PhaseRequest::On(Phase::TICK),
        }
    }

    /// 等待下一次 tick。
    pub fn next() -> Self {
        WaitForTicks::new(1)
    }

    pub fn remaining(&self) -> i64 {
        self.remaining
    }
}

impl Staller for WaitForTicks {
    fn is_complete(&self) -> bool {
        self.remaining <= 0
    }

    fn desired_phase(&self) -> &PhaseRequest {
        &self.phase
    }

    fn advance(&mut self, _cx: &StepContext<'_>) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    fn describe(&self) -> String {
        format!("WaitForTicks(remaining: {})", self.remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::Clock, phase::HostRole, scheduler::Spawner};

    #[test]
    fn test_completes_after_exactly_n_advances() {
        let clock = Clock::default();
        let spawner = Spawner::new();
        let cx = StepContext::new(&Phase::TICK, &clock, HostRole::Client, &spawner);

        for n in 1..=5 {
            let mut staller = WaitForTicks::new(n);
            for _ in 0..n - 1 {
                staller.advance(&cx);
            }
            assert!(!staller.is_complete(), "incomplete after {} advances", n - 1);
            staller.advance(&cx);
            assert!(staller.is_complete(), "complete after {} advances", n);
        }
    }

    #[test]
    fn test_next_tick_is_one_tick() {
        let staller = WaitForTicks::next();
        assert_eq!(staller.remaining(), 1);
        assert_eq!(staller.desired_phase(), &PhaseRequest::On(Phase::TICK));
    }

    #[test]
    fn test_non_positive_counts_stay_complete() {
        let clock = Clock::default();
        let spawner = Spawner::new();
        let cx = StepContext::new(&Phase::TICK, &clock, HostRole::Client, &spawner);

        for ticks in [0, -3, i64::MIN] {
            let mut staller = WaitForTicks::new(ticks);
            assert!(staller.is_complete());
            staller.advance(&cx);
            staller.advance(&cx);
            assert!(staller.is_complete(), "{} ticks", ticks);
        }
        let mut staller = WaitForTicks::new(i64::MIN);
        staller.advance(&cx);
        assert_eq!(staller.remaining(), i64::MIN);
    }
}
