use crate::{
    context::StepContext,
    error::StallerError,
    phase::{HostRole, Phase, PhaseRequest},
    staller::{checked, preferred_or, Staller},
};

/// 一次性阶段切换：在下一次 `phase` 出现时完成，之后协程沿用该阶段。
pub struct WaitForNextPhase {
    done: bool,
    phase: PhaseRequest,
}

impl WaitForNextPhase {
    pub fn new(phase: Phase, role: HostRole) -> Result<Self, StallerError> {
        Ok(WaitForNextPhase {
            done: false,
            phase: checked(phase, role)?,
        })
    }

    pub fn tick() -> Self {
        WaitForNextPhase {
            done: false,
            phase: PhaseRequest::On(Phase::TICK),
        }
    }

    pub fn simulate() -> Self {
        WaitForNextPhase {
            done: false,
            phase: PhaseRequest::On(Phase::SIMULATE),
        }
    }
}

impl Staller for WaitForNextPhase {
    fn is_complete(&self) -> bool {
        self.done
    }

    fn desired_phase(&self) -> &PhaseRequest {
        &self.phase
    }

    fn advance(&mut self, _cx: &StepContext<'_>) {
        self.done = true;
    }

    fn describe(&self) -> String {
        format!("WaitForNextPhase({})", self.phase)
    }
}

/// 按角色协商的阶段切换：角色支持 `preferred` 时等待它，否则等待 `fallback`。
pub struct WaitForPreferredPhase {
    done: bool,
    phase: PhaseRequest,
}

impl WaitForPreferredPhase {
    pub fn new(preferred: Phase, fallback: Phase, role: HostRole) -> Self {
        WaitForPreferredPhase {
            done: false,
            phase: preferred_or(preferred, fallback, role),
        }
    }

    /// 客户端等待下一帧，服务端等待下一次 tick。
    pub fn frame_or_tick(role: HostRole) -> Self {
        WaitForPreferredPhase::new(Phase::FRAME, Phase::TICK, role)
    }

    /// 协商后的阶段。
    pub fn resolved(&self) -> &PhaseRequest {
        &self.phase
    }
}

impl Staller for WaitForPreferredPhase {
    fn is_complete(&self) -> bool {
        self.done
    }

    fn desired_phase(&self) -> &PhaseRequest {
        &self.phase
    }

    fn advance(&mut self, _cx: &StepContext<'_>) {
        self.done = true;
    }

    fn describe(&self) -> String {
        format!("WaitForPreferredPhase({})", self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_or_tick_follows_role() {
        assert_eq!(
            WaitForPreferredPhase::frame_or_tick(HostRole::Client).resolved(),
            &PhaseRequest::On(Phase::FRAME)
        );
        assert_eq!(
            WaitForPreferredPhase::frame_or_tick(HostRole::Server).resolved(),
            &PhaseRequest::On(Phase::TICK)
        );
    }

    #[test]
    fn test_next_phase_checks_role() {
        assert!(WaitForNextPhase::new(Phase::FRAME, HostRole::Server).is_err());
        let custom = WaitForNextPhase::new(Phase::named("late"), HostRole::Server).unwrap();
        assert_eq!(custom.desired_phase(), &PhaseRequest::On(Phase::named("late")));
        assert!(!custom.is_complete());
    }
}
