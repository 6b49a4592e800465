use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use crate::{
    coroutine::Coroutine,
    handle::{CoroutineHandle, Ticket},
};

struct Queues {
    to_add: Mutex<VecDeque<Ticket>>,
    to_remove: Mutex<VecDeque<CoroutineHandle>>,
    next_id: AtomicU64,
    closed: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // 队列操作不会在持锁期间 panic，中毒只可能来自外部，数据本身仍然一致
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// 调度器的线程安全前端。
///
/// 可以克隆并发送到任意线程；`start` 与 `stop` 只是入队，
/// 真正的加入与移除在调度器线程的 `step_phase` 中完成。
#[derive(Clone)]
pub struct Spawner {
    queues: Arc<Queues>,
}

impl Spawner {
    pub(crate) fn new() -> Self {
        Spawner {
            queues: Arc::new(Queues {
                to_add: Mutex::new(VecDeque::new()),
                to_remove: Mutex::new(VecDeque::new()),
                next_id: AtomicU64::new(1),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// 调用 `producer` 取得协程并加入队列，立即返回句柄。
    pub fn start<C, P>(&self, producer: P) -> CoroutineHandle
    where
        C: Coroutine + 'static,
        P: FnOnce() -> C,
    {
        self.spawn(Box::new(producer()))
    }

    /// 与 `start` 相同，但把 `args` 传给 `producer`。
    pub fn start_with<A, C, P>(&self, producer: P, args: A) -> CoroutineHandle
    where
        C: Coroutine + 'static,
        P: FnOnce(A) -> C,
    {
        self.spawn(Box::new(producer(args)))
    }

    /// 重新加入一个已有的协程序列，序列从上次停下的位置继续。
    pub fn start_existing(&self, handle: &CoroutineHandle) {
        self.enqueue(handle);
    }

    /// 请求移除 `handle` 的一个实例。
    pub fn stop(&self, handle: &CoroutineHandle) {
        if self.queues.closed.load(Ordering::Acquire) {
            log::debug!("Scheduler is shut down, ignoring stop of #{}", handle.id());
            return;
        }
        log::debug!("Queued stop of coroutine #{}", handle.id());
        lock(&self.queues.to_remove).push_back(handle.clone());
    }

    fn spawn(&self, body: Box<dyn Coroutine>) -> CoroutineHandle {
        let id = self.queues.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = CoroutineHandle::new(id, body);
        self.enqueue(&handle);
        handle
    }

    fn enqueue(&self, handle: &CoroutineHandle) {
        let mut to_add = lock(&self.queues.to_add);
        if self.queues.closed.load(Ordering::Acquire) {
            log::warn!(
                "Scheduler is shut down, coroutine #{} will never run",
                handle.id()
            );
            return;
        }
        log::debug!("Queued coroutine #{} for admission", handle.id());
        to_add.push_back(handle.enroll());
    }

    pub(crate) fn take_additions(&self) -> VecDeque<Ticket> {
        std::mem::take(&mut *lock(&self.queues.to_add))
    }

    pub(crate) fn take_removals(&self) -> VecDeque<CoroutineHandle> {
        std::mem::take(&mut *lock(&self.queues.to_remove))
    }

    /// 把未能处理的移除请求放回队首，保持原有顺序。
    pub(crate) fn defer_removals(&self, handles: Vec<CoroutineHandle>) {
        let mut to_remove = lock(&self.queues.to_remove);
        for handle in handles.into_iter().rev() {
            to_remove.push_front(handle);
        }
    }

    pub(crate) fn is_queued_for_add(&self, handle: &CoroutineHandle) -> bool {
        lock(&self.queues.to_add)
            .iter()
            .any(|ticket| ticket.handle() == handle)
    }

    pub(crate) fn is_queued_for_remove(&self, handle: &CoroutineHandle) -> bool {
        lock(&self.queues.to_remove).iter().any(|h| h == handle)
    }

    /// 取消一个针对 `handle` 的移除请求，存在时返回 true。
    pub(crate) fn consume_removal(&self, handle: &CoroutineHandle) -> bool {
        let mut to_remove = lock(&self.queues.to_remove);
        match to_remove.iter().position(|h| h == handle) {
            Some(index) => {
                to_remove.remove(index);
                true
            }
            None => false,
        }
    }

    /// 加入队列中每个条目对应的句柄（同一句柄可能出现多次）。
    pub(crate) fn queued_handles(&self) -> Vec<CoroutineHandle> {
        lock(&self.queues.to_add)
            .iter()
            .map(|ticket| ticket.handle().clone())
            .collect()
    }

    /// 拒绝之后的所有请求并清空队列。
    pub(crate) fn close(&self) {
        self.queues.closed.store(true, Ordering::Release);
        // 先取出再释放，避免在持锁时运行 Ticket 的析构
        let additions = self.take_additions();
        let removals = self.take_removals();
        drop(additions);
        drop(removals);
    }

    pub fn is_closed(&self) -> bool {
        self.queues.closed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{coroutine::from_iter, staller::Staller};

    fn empty() -> impl Coroutine {
        from_iter(Vec::<Box<dyn Staller>>::new())
    }

    #[test]
    fn test_start_enrolls_until_taken() {
        let spawner = Spawner::new();
        let handle = spawner.start(empty);
        assert!(!handle.is_complete());
        assert!(spawner.is_queued_for_add(&handle));

        let additions = spawner.take_additions();
        assert_eq!(additions.len(), 1);
        assert!(!spawner.is_queued_for_add(&handle));
        drop(additions);
        assert!(handle.is_complete());
    }

    #[test]
    fn test_start_with_passes_arguments() {
        let spawner = Spawner::new();
        let handle = spawner.start_with(
            |count: usize| {
                let stallers: Vec<Box<dyn Staller>> = (0..count)
                    .map(|_| Box::new(crate::stallers::WaitForTicks::next()) as Box<dyn Staller>)
                    .collect();
                from_iter(stallers)
            },
            3,
        );
        assert_eq!(spawner.queued_handles(), vec![handle]);
    }

    #[test]
    fn test_consume_removal_takes_one_request() {
        let spawner = Spawner::new();
        let handle = spawner.start(empty);
        spawner.stop(&handle);
        spawner.stop(&handle);
        assert!(spawner.is_queued_for_remove(&handle));
        assert!(spawner.consume_removal(&handle));
        assert!(spawner.consume_removal(&handle));
        assert!(!spawner.consume_removal(&handle));
    }

    #[test]
    fn test_closed_spawner_rejects_requests() {
        let spawner = Spawner::new();
        let queued = spawner.start(empty);
        spawner.close();
        assert!(spawner.is_closed());
        assert!(queued.is_complete());

        let late = spawner.start(empty);
        assert!(late.is_complete());
        spawner.stop(&late);
        assert!(spawner.take_additions().is_empty());
        assert!(spawner.take_removals().is_empty());
    }

    #[test]
    fn test_spawner_is_shared_across_threads() {
        let spawner = Spawner::new();
        let remote = spawner.clone();
        let handle = std::thread::spawn(move || remote.start(empty))
            .join()
            .unwrap();
        assert!(spawner.is_queued_for_add(&handle));
    }
}
