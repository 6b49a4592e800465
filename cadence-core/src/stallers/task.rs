//! 异步工作桥接。
//!
//! 外部异步工作在别的线程或运行时上执行，协程只在自己的线程上轮询其完成状态。
//! 轮询放在帧阶段（服务端回退到 tick），以便尽快在恢复后观察到结果。

use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    task::{Context, Poll, Wake, Waker},
    thread::JoinHandle,
};

use crate::{
    context::StepContext,
    phase::{HostRole, Phase, PhaseRequest},
    staller::{preferred_or, Staller},
};

/// 可以查询是否已经结束的外部操作。
pub trait Completion: Send {
    fn is_resolved(&self) -> bool;
}

impl<T: Send> Completion for JoinHandle<T> {
    fn is_resolved(&self) -> bool {
        self.is_finished()
    }
}

#[cfg(feature = "tokio")]
impl<T: Send> Completion for tokio::task::JoinHandle<T> {
    fn is_resolved(&self) -> bool {
        self.is_finished()
    }
}

impl Completion for Arc<AtomicBool> {
    fn is_resolved(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}

/// 等待外部操作结束。
pub struct WaitForTask<C> {
    operation: C,
    resolved: bool,
    phase: PhaseRequest,
}

impl<C: Completion> WaitForTask<C> {
    pub fn new(operation: C, role: HostRole) -> Self {
        WaitForTask {
            operation,
            resolved: false,
            phase: preferred_or(Phase::FRAME, Phase::TICK, role),
        }
    }
}

impl<C: Completion> Staller for WaitForTask<C> {
    fn is_complete(&self) -> bool {
        self.resolved
    }

    fn desired_phase(&self) -> &PhaseRequest {
        &self.phase
    }

    fn advance(&mut self, _cx: &StepContext<'_>) {
        self.resolved = self.operation.is_resolved();
    }

    fn describe(&self) -> String {
        format!("WaitForTask(resolved: {})", self.resolved)
    }
}

struct NoopWake;

impl Wake for NoopWake {
    fn wake(self: Arc<Self>) {}
}

/// 在协程线程上直接轮询一个 Future，每次推进轮询一次。
///
/// 不注册唤醒：调度器每个匹配阶段都会重新轮询。输出值被丢弃，
/// 需要结果时请在 Future 内部写入共享状态。
///
/// `new` 在任何运行时上下文之外轮询，只适用于不依赖运行时的 Future。
/// 依赖 tokio 定时器或 I/O 的 Future 必须用 `with_runtime` 构造，
/// 否则轮询时会因为没有 reactor 而 panic。
pub struct WaitForFuture {
    future: Option<Pin<Box<dyn Future<Output = ()> + Send>>>,
    waker: Waker,
    phase: PhaseRequest,
    #[cfg(feature = "tokio")]
    runtime: Option<tokio::runtime::Handle>,
}

impl WaitForFuture {
    pub fn new<F>(future: F, role: HostRole) -> Self
    where
        F: Future + Send + 'static,
    {
        WaitForFuture {
            future: Some(Box::pin(async move {
                let _ = future.await;
            })),
            waker: Waker::from(Arc::new(NoopWake)),
            phase: preferred_or(Phase::FRAME, Phase::TICK, role),
            #[cfg(feature = "tokio")]
            runtime: None,
        }
    }

    /// 轮询时进入 `runtime` 的上下文，定时器与 I/O 由该运行时的驱动推进。
    ///
    /// `tokio::time::sleep` 这类在构造时就绑定运行时的 Future 需要包在 `async` 块里传入。
    #[cfg(feature = "tokio")]
    pub fn with_runtime<F>(future: F, runtime: tokio::runtime::Handle, role: HostRole) -> Self
    where
        F: Future + Send + 'static,
    {
        WaitForFuture {
            runtime: Some(runtime),
            ..WaitForFuture::new(future, role)
        }
    }
}

impl Staller for WaitForFuture {
    fn is_complete(&self) -> bool {
        self.future.is_none()
    }

    fn desired_phase(&self) -> &PhaseRequest {
        &self.phase
    }

    fn advance(&mut self, _cx: &StepContext<'_>) {
        let Some(future) = self.future.as_mut() else {
            return;
        };
        #[cfg(feature = "tokio")]
        let _guard = self.runtime.as_ref().map(tokio::runtime::Handle::enter);
        let mut context = Context::from_waker(&self.waker);
        if let Poll::Ready(()) = future.as_mut().poll(&mut context) {
            self.future = None;
        }
    }

    fn describe(&self) -> String {
        format!("WaitForFuture(ready: {})", self.future.is_none())
    }
}
