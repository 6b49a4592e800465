#[cfg(feature = "serde_support")]
use serde::{Deserialize, Serialize};

use crate::phase::{HostRole, Phase};

/// 协程推进失败（返回错误或 panic）之后的处理方式。
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(
    feature = "serde_support",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum FaultPolicy {
    /// 强制结束故障协程，在同一次 `step_phase` 中移除。
    #[default]
    Finish,
    /// 保留故障协程，下一次匹配阶段时重新推进当前停顿器。
    Retry,
}

/// 调度器配置。
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde_support",
    derive(Serialize, Deserialize),
    serde(default)
)]
pub struct SchedulerConfig {
    /// 协程尚未请求任何具体阶段时使用的阶段。
    pub default_phase: Phase,
    pub fault_policy: FaultPolicy,
    pub role: HostRole,
    /// 初始时间缩放。
    pub time_scale: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            default_phase: Phase::TICK,
            fault_policy: FaultPolicy::default(),
            role: HostRole::default(),
            time_scale: 1.0,
        }
    }
}
