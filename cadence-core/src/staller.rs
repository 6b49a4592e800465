//! 停顿器协议。
//!
//! 停顿器（Staller）描述协程的一个挂起点：何时完成、希望在哪个阶段被推进、以及每次推进时如何更新自身状态。

use crate::{
    context::StepContext,
    error::StallerError,
    phase::{HostRole, Phase, PhaseRequest},
};

/// 协程挂起条件。
///
/// `is_complete` 与 `desired_phase` 是纯查询；`advance` 只修改停顿器自身的状态，
/// 不允许在其中同步地恢复其他协程。
pub trait Staller: Send {
    fn is_complete(&self) -> bool;

    fn desired_phase(&self) -> &PhaseRequest;

    fn advance(&mut self, cx: &StepContext<'_>);

    /// 用于故障报告的简短描述。
    fn describe(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

/// 检查角色是否支持 `phase`，返回可存储的阶段请求。
pub(crate) fn checked(phase: Phase, role: HostRole) -> Result<PhaseRequest, StallerError> {
    let request = PhaseRequest::On(phase);
    role.check(&request)?;
    Ok(request)
}

/// 角色支持时使用 `preferred`，否则使用 `fallback`。
pub(crate) fn preferred_or(preferred: Phase, fallback: Phase, role: HostRole) -> PhaseRequest {
    if role.supports(&preferred) {
        PhaseRequest::On(preferred)
    } else {
        PhaseRequest::On(fallback)
    }
}
