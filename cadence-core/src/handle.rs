use std::{
    fmt::{Debug, Formatter},
    hash::{Hash, Hasher},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, PoisonError, TryLockError,
    },
};

use crate::{
    context::StepContext,
    coroutine::{Coroutine, Step},
    error::CoroutineError,
};

struct HandleInner {
    id: u64,
    body: Mutex<Box<dyn Coroutine>>,
    // 仍在调度器中的条目数（等待加入、等待阶段、活跃）
    live: AtomicUsize,
}

/// 已启动协程序列的身份。
///
/// 相等性与哈希都按身份（指针）比较，绝不按值比较。
/// 句柄可以跨线程传递，用于 `stop` 与完成查询。
#[derive(Clone)]
pub struct CoroutineHandle {
    inner: Arc<HandleInner>,
}

impl CoroutineHandle {
    pub(crate) fn new(id: u64, body: Box<dyn Coroutine>) -> Self {
        CoroutineHandle {
            inner: Arc::new(HandleInner {
                id,
                body: Mutex::new(body),
                live: AtomicUsize::new(0),
            }),
        }
    }

    /// 调度器分配的序号，只用于日志与报告。
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// 句柄不再处于任何调度器中时为 true，从未启动的句柄同样视为完成。
    pub fn is_complete(&self) -> bool {
        self.inner.live.load(Ordering::Acquire) == 0
    }

    pub(crate) fn enroll(&self) -> Ticket {
        self.inner.live.fetch_add(1, Ordering::AcqRel);
        Ticket {
            handle: self.clone(),
        }
    }

    pub(crate) fn resume(&self, cx: &StepContext<'_>) -> Result<Step, CoroutineError> {
        // 协程体曾经 panic 时锁会中毒，但序列本身仍可继续使用
        let mut body = self.inner.body.lock().unwrap_or_else(PoisonError::into_inner);
        body.resume(cx)
    }

    pub fn format_context(&self) -> String {
        match self.inner.body.try_lock() {
            Ok(body) => body.format_context(),
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner().format_context(),
            Err(TryLockError::WouldBlock) => "<running>".to_string(),
        }
    }
}

impl PartialEq for CoroutineHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for CoroutineHandle {}

impl Hash for CoroutineHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.inner) as *const () as usize).hash(state);
    }
}

impl Debug for CoroutineHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CoroutineHandle(#{}, complete: {})",
            self.inner.id,
            self.is_complete()
        )
    }
}

/// 句柄在调度器中的一个存活条目。
///
/// 由加入队列、等待表或活跃集合持有，丢弃时自动减少句柄的存活计数。
pub(crate) struct Ticket {
    handle: CoroutineHandle,
}

impl Ticket {
    pub(crate) fn handle(&self) -> &CoroutineHandle {
        &self.handle
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        self.handle.inner.live.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{coroutine::from_iter, staller::Staller};
    use std::collections::HashSet;

    fn empty_handle(id: u64) -> CoroutineHandle {
        CoroutineHandle::new(id, Box::new(from_iter(Vec::<Box<dyn Staller>>::new())))
    }

    #[test]
    fn test_identity_not_value_equality() {
        let a = empty_handle(1);
        let b = empty_handle(1);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());

        let mut set = HashSet::new();
        set.insert(a.clone());
        assert!(set.contains(&a));
        assert!(!set.contains(&b));
    }

    #[test]
    fn test_tickets_track_liveness() {
        let handle = empty_handle(3);
        assert!(handle.is_complete());

        let first = handle.enroll();
        let second = handle.enroll();
        assert!(!handle.is_complete());
        drop(first);
        assert!(!handle.is_complete());
        drop(second);
        assert!(handle.is_complete());
    }
}
