//! 停顿器库。
//!
//! - `ticks` / `frames`：按次数计数的等待
//! - `time`：按游戏时间（受缩放）或真实时间等待
//! - `until`：等待谓词成立
//! - `coroutine`：等待另一个协程完成
//! - `task`：把外部异步工作（线程、tokio 任务、Future）桥接进协作式模型
//! - `phase`：一次性切换阶段，以及按角色协商首选阶段
//! - `simulate`：等待下一次输入模拟

pub mod coroutine;
pub mod frames;
pub mod phase;
pub mod simulate;
pub mod task;
pub mod ticks;
pub mod time;
pub mod until;

pub use coroutine::WaitForCoroutine;
pub use frames::WaitForFrames;
pub use phase::{WaitForNextPhase, WaitForPreferredPhase};
pub use simulate::WaitForNextSimulate;
pub use task::{Completion, WaitForFuture, WaitForTask};
pub use ticks::WaitForTicks;
pub use time::{WaitForRealSeconds, WaitForSeconds};
pub use until::WaitUntil;
