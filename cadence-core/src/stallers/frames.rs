use crate::{
    context::StepContext,
    error::StallerError,
    phase::{HostRole, Phase, PhaseRequest},
    staller::{checked, Staller},
};

/// 等待指定数量的渲染帧。只能在支持 `Phase::FRAME` 的角色中构造。
pub struct WaitForFrames {
    remaining: i64,
    phase: PhaseRequest,
}

impl WaitForFrames {
    pub fn new(frames: i64, role: HostRole) -> Result<Self, StallerError> {
        Ok(WaitForFrames {
            remaining: frames,
            phase: checked(Phase::FRAME, role)?,
        })
    }

    /// 等待下一帧。
    pub fn next(role: HostRole) -> Result<Self, StallerError> {
        WaitForFrames::new(1, role)
    }

    pub fn remaining(&self) -> i64 {
        self.remaining
    }
}

impl Staller for WaitForFrames {
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
        format!("WaitForFrames(remaining: {})", self.remaining)
    }
}
