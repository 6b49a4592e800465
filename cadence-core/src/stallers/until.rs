use crate::{
    context::StepContext,
    error::StallerError,
    phase::{HostRole, Phase, PhaseRequest},
    staller::{checked, Staller},
};

/// 等待谓词返回 true，每次推进时重新求值。
pub struct WaitUntil<F> {
    predicate: F,
    satisfied: bool,
    phase: PhaseRequest,
}

impl<F> WaitUntil<F>
where
    F: FnMut() -> bool + Send,
{
    pub fn new(predicate: F) -> Self {
        WaitUntil {
            predicate,
            satisfied: false,
            phase: PhaseRequest::Preserve,
        }
    }

    pub fn on(mut self, phase: Phase, role: HostRole) -> Result<Self, StallerError> {
        self.phase = checked(phase, role)?;
        Ok(self)
    }
}

impl<F> Staller for WaitUntil<F>
where
    F: FnMut() -> bool + Send,
{
    fn is_complete(&self) -> bool {
        self.satisfied
    }

    fn desired_phase(&self) -> &PhaseRequest {
        &self.phase
    }

    fn advance(&mut self, _cx: &StepContext<'_>) {
        self.satisfied = (self.predicate)();
    }

    fn describe(&self) -> String {
        "WaitUntil".to_string()
    }
}
