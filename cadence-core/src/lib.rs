//! Cadence 核心：由宿主阶段驱动的单线程协作式协程调度器。
//!
//! 协程体是可恢复的步进函数，每次恢复返回一个停顿器（Staller）。
//! 宿主在每次阶段出现时调用 `Scheduler::step_phase`，调度器推进所有在该阶段等待的协程。

pub mod bucket;
pub mod clock;
pub mod config;
pub mod context;
pub mod coroutine;
pub mod error;
pub mod handle;
mod instance;
pub mod phase;
pub mod scheduler;
pub mod staller;
pub mod stallers;

pub use bucket::CoroutineBucket;
pub use clock::Clock;
pub use config::{FaultPolicy, SchedulerConfig};
pub use context::{ClientId, SimulationFrame, StepContext};
pub use coroutine::{from_fn, from_iter, Coroutine, Step};
pub use error::{CoroutineError, StallerError};
pub use handle::CoroutineHandle;
pub use phase::{HostRole, Phase, PhaseRequest};
pub use scheduler::{CoroutineStatus, FaultKind, FaultReport, Scheduler, Spawner, StepReport};
pub use staller::Staller;
