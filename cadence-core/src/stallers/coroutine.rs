use crate::{
    context::StepContext,
    error::StallerError,
    handle::CoroutineHandle,
    phase::{HostRole, Phase, PhaseRequest},
    staller::{checked, Staller},
};

/// 等待另一个协程完成。
///
/// 完成的判定与 `Scheduler::is_complete` 一致，因此等待链会传递式地解析：
/// A 等待 B、B 等待 C 时，A 只会在 C 完成之后完成。
pub struct WaitForCoroutine {
    target: CoroutineHandle,
    done: bool,
    phase: PhaseRequest,
}

impl WaitForCoroutine {
    pub fn new(target: CoroutineHandle) -> Self {
        WaitForCoroutine {
            target,
            done: false,
            phase: PhaseRequest::Preserve,
        }
    }

    pub fn on(mut self, phase: Phase, role: HostRole) -> Result<Self, StallerError> {
        self.phase = checked(phase, role)?;
        Ok(self)
    }

    pub fn target(&self) -> &CoroutineHandle {
        &self.target
    }
}

impl Staller for WaitForCoroutine {
    fn is_complete(&self) -> bool {
        self.done
    }

    fn desired_phase(&self) -> &PhaseRequest {
        &self.phase
    }

    fn advance(&mut self, _cx: &StepContext<'_>) {
        self.done = self.target.is_complete();
    }

    fn describe(&self) -> String {
        format!("WaitForCoroutine(#{})", self.target.id())
    }
}
