//! 阶段驱动的协程调度器。
//!
//! - `scheduler`：单线程拥有的调度器本体，按阶段推进协程
//! - `spawner`：可跨线程使用的启动/停止前端
//! - `report`：每次推进的统计与故障报告

pub mod report;
pub mod scheduler;
pub mod spawner;

pub use report::{FaultKind, FaultReport, StepReport};
pub use scheduler::{CoroutineStatus, Scheduler};
pub use spawner::Spawner;
