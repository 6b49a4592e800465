//! 阶段（Phase）与宿主角色（HostRole）。
//!
//! 阶段是宿主更新循环中的命名时间点，调度器只比较相等性，不解释其含义。
//! `PhaseRequest` 表示一个停顿器希望在哪个阶段被推进，`Preserve` 表示沿用协程上一次的具体阶段。

use std::{
    borrow::Cow,
    fmt::{self, Display},
};

#[cfg(feature = "serde_support")]
use serde::{Deserialize, Serialize};

use crate::error::StallerError;

/// 宿主定义的阶段标识。
///
/// 相等性按名字比较，内置阶段可以在 `const` 上下文中使用。
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde_support", derive(Serialize, Deserialize), serde(transparent))]
pub struct Phase(Cow<'static, str>);

impl Phase {
    /// 固定步长的逻辑帧（tick）。
    pub const TICK: Phase = Phase(Cow::Borrowed("tick"));
    /// 渲染帧，只在客户端类角色中存在。
    pub const FRAME: Phase = Phase(Cow::Borrowed("frame"));
    /// 输入模拟。
    pub const SIMULATE: Phase = Phase(Cow::Borrowed("simulate"));

    pub const fn named(name: &'static str) -> Self {
        Phase(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for Phase {
    fn from(name: &'static str) -> Self {
        Phase(Cow::Borrowed(name))
    }
}

impl From<String> for Phase {
    fn from(name: String) -> Self {
        Phase(Cow::Owned(name))
    }
}

/// 停顿器期望的推进阶段。
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum PhaseRequest {
    /// 沿用协程最近一次指定的具体阶段。
    Preserve,
    On(Phase),
}

impl PhaseRequest {
    /// 把请求解析为具体阶段，`Preserve` 解析为 `last`。
    pub fn resolve<'a>(&'a self, last: &'a Phase) -> &'a Phase {
        match self {
            PhaseRequest::Preserve => last,
            PhaseRequest::On(phase) => phase,
        }
    }

    pub fn concrete(&self) -> Option<&Phase> {
        match self {
            PhaseRequest::Preserve => None,
            PhaseRequest::On(phase) => Some(phase),
        }
    }
}

impl From<Phase> for PhaseRequest {
    fn from(phase: Phase) -> Self {
        PhaseRequest::On(phase)
    }
}

impl Display for PhaseRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseRequest::Preserve => f.write_str("<preserve>"),
            PhaseRequest::On(phase) => write!(f, "{}", phase),
        }
    }
}

/// 宿主当前的执行角色。
///
/// 服务端是无界面的，不存在 `Phase::FRAME`。
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(
    feature = "serde_support",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum HostRole {
    #[default]
    Client,
    Menu,
    Server,
}

impl HostRole {
    pub fn supports(self, phase: &Phase) -> bool {
        !(self == HostRole::Server && *phase == Phase::FRAME)
    }

    /// 构造停顿器时的角色前置检查。`Preserve` 总是允许的。
    pub fn check(self, request: &PhaseRequest) -> Result<(), StallerError> {
        match request.concrete() {
            Some(phase) if !self.supports(phase) => Err(StallerError::UnsupportedPhase {
                phase: phase.clone(),
                role: self,
            }),
            _ => Ok(()),
        }
    }
}

impl Display for HostRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostRole::Client => f.write_str("client"),
            HostRole::Menu => f.write_str("menu"),
            HostRole::Server => f.write_str("server"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_equality_is_by_name() {
        assert_eq!(Phase::from("tick".to_string()), Phase::TICK);
        assert_eq!(Phase::named("physics"), Phase::from("physics"));
        assert_ne!(Phase::TICK, Phase::FRAME);
    }

    #[test]
    fn test_preserve_resolves_to_last_phase() {
        let last = Phase::named("late");
        assert_eq!(PhaseRequest::Preserve.resolve(&last), &last);
        assert_eq!(PhaseRequest::On(Phase::TICK).resolve(&last), &Phase::TICK);
        assert_eq!(PhaseRequest::Preserve.concrete(), None);
    }

    #[test]
    fn test_server_rejects_frame_phase() {
        assert!(!HostRole::Server.supports(&Phase::FRAME));
        assert!(HostRole::Server.supports(&Phase::TICK));
        assert!(HostRole::Menu.supports(&Phase::FRAME));

        let err = HostRole::Server
            .check(&PhaseRequest::On(Phase::FRAME))
            .unwrap_err();
        assert_eq!(
            err,
            StallerError::UnsupportedPhase {
                phase: Phase::FRAME,
                role: HostRole::Server,
            }
        );
        assert!(HostRole::Server.check(&PhaseRequest::Preserve).is_ok());
    }

    #[cfg(feature = "serde_support")]
    #[test]
    fn test_phase_and_role_serde() {
        let phase: Phase = serde_json::from_str("\"physics\"").unwrap();
        assert_eq!(phase, Phase::named("physics"));
        assert_eq!(serde_json::to_string(&Phase::FRAME).unwrap(), "\"frame\"");

        let role: HostRole = serde_json::from_str("\"server\"").unwrap();
        assert_eq!(role, HostRole::Server);
    }
}
