use crate::{
    context::{ClientId, StepContext},
    phase::{Phase, PhaseRequest},
    staller::Staller,
};

/// 等待下一次输入模拟。
///
/// `client` 为 `None` 时接受任意客户端；`first_time_only` 为 true 时忽略预测重放。
/// 宿主没有提供 `SimulationFrame` 的推进不计入。
pub struct WaitForNextSimulate {
    client: Option<ClientId>,
    first_time_only: bool,
    done: bool,
    phase: PhaseRequest,
}

impl WaitForNextSimulate {
    pub fn new(client: Option<ClientId>, first_time_only: bool) -> Self {
        WaitForNextSimulate {
            client,
            first_time_only,
            done: false,
            phase: PhaseRequest::On(Phase::SIMULATE),
        }
    }

    /// 任意客户端的首次模拟。
    pub fn any() -> Self {
        WaitForNextSimulate::new(None, true)
    }
}

impl Staller for WaitForNextSimulate {
    fn is_complete(&self) -> bool {
        self.done
    }

    fn desired_phase(&self) -> &PhaseRequest {
        &self.phase
    }

    fn advance(&mut self, cx: &StepContext<'_>) {
        let Some(frame) = cx.simulation() else {
            return;
        };
        if self.client.is_some_and(|client| client != frame.client) {
            return;
        }
        if self.first_time_only && !frame.first_time {
            return;
        }
        self.done = true;
    }

    fn describe(&self) -> String {
        match self.client {
            Some(client) => format!("WaitForNextSimulate(client: {})", client),
            None => "WaitForNextSimulate(any)".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::Clock, context::SimulationFrame, phase::HostRole, scheduler::Spawner,
    };

    fn advance_with(staller: &mut WaitForNextSimulate, frame: Option<SimulationFrame>) {
        let clock = Clock::default();
        let spawner = Spawner::new();
        let cx = StepContext::new(&Phase::SIMULATE, &clock, HostRole::Server, &spawner)
            .with_simulation(frame.as_ref());
        staller.advance(&cx);
    }

    #[test]
    fn test_waits_for_matching_client() {
        let mut staller = WaitForNextSimulate::new(Some(2), true);
        assert_eq!(staller.desired_phase(), &PhaseRequest::On(Phase::SIMULATE));

        advance_with(&mut staller, None);
        assert!(!staller.is_complete());

        advance_with(&mut staller, Some(SimulationFrame { client: 1, first_time: true }));
        assert!(!staller.is_complete());

        advance_with(&mut staller, Some(SimulationFrame { client: 2, first_time: true }));
        assert!(staller.is_complete());
    }

    #[test]
    fn test_replays_are_skipped_when_first_time_only() {
        let mut strict = WaitForNextSimulate::any();
        advance_with(&mut strict, Some(SimulationFrame { client: 9, first_time: false }));
        assert!(!strict.is_complete());

        let mut lenient = WaitForNextSimulate::new(None, false);
        advance_with(&mut lenient, Some(SimulationFrame { client: 9, first_time: false }));
        assert!(lenient.is_complete());
    }
}
