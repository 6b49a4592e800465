use std::fmt::Display;

use crate::{error::CoroutineError, handle::CoroutineHandle, phase::Phase};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FaultKind {
    /// 加入时首次驱动协程体失败。
    Admission,
    /// 推进停顿器或恢复协程体失败。
    Advance,
}

impl Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaultKind::Admission => f.write_str("admission"),
            FaultKind::Advance => f.write_str("advance"),
        }
    }
}

/// 单个协程的故障记录。
#[derive(Clone, Debug)]
pub struct FaultReport {
    pub handle: CoroutineHandle,
    /// 协程体与当前停顿器的描述。
    pub context: String,
    pub phase: Phase,
    pub kind: FaultKind,
    pub error: CoroutineError,
}

impl Display for FaultReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Coroutine #{} faulted during {} in phase '{}' ({}): {}",
            self.handle.id(),
            self.kind,
            self.phase,
            self.context,
            self.error
        )
    }
}

/// 一次 `step_phase` 调用的统计。
#[derive(Clone, Debug)]
pub struct StepReport {
    pub phase: Phase,
    /// 被推进的活跃实例数。
    pub advanced: usize,
    /// 在本次推进中结束的实例数。
    pub finished: usize,
    /// 进入等待表的新实例数。
    pub admitted: usize,
    /// 从等待表移入活跃集合的实例数。
    pub activated: usize,
    /// 加入时被丢弃的条目数（已被停止、构造即结束或构造失败）。
    pub discarded: usize,
    pub removed: usize,
    pub faults: Vec<FaultReport>,
}

impl StepReport {
    pub fn new(phase: Phase) -> Self {
        StepReport {
            phase,
            advanced: 0,
            finished: 0,
            admitted: 0,
            activated: 0,
            discarded: 0,
            removed: 0,
            faults: Vec::new(),
        }
    }

    pub fn has_faults(&self) -> bool {
        !self.faults.is_empty()
    }
}
