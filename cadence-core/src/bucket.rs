use std::{marker::PhantomData, rc::Rc};

use crate::{coroutine::Coroutine, handle::CoroutineHandle, scheduler::Spawner};

/// 一组与所有者生命周期绑定的协程。
///
/// 记录通过它启动的每个句柄，被丢弃时停止仍在记录中的全部协程。
/// 只能在所有者线程上使用。
pub struct CoroutineBucket {
    spawner: Spawner,
    coroutines: Vec<CoroutineHandle>,
    _owner: PhantomData<Rc<()>>,
}

impl CoroutineBucket {
    pub fn new(spawner: Spawner) -> Self {
        CoroutineBucket {
            spawner,
            coroutines: Vec::new(),
            _owner: PhantomData,
        }
    }

    pub fn start<C, P>(&mut self, producer: P) -> CoroutineHandle
    where
        C: Coroutine + 'static,
        P: FnOnce() -> C,
    {
        let handle = self.spawner.start(producer);
        self.coroutines.push(handle.clone());
        handle
    }

    pub fn start_with<A, C, P>(&mut self, producer: P, args: A) -> CoroutineHandle
    where
        C: Coroutine + 'static,
        P: FnOnce(A) -> C,
    {
        let handle = self.spawner.start_with(producer, args);
        self.coroutines.push(handle.clone());
        handle
    }

    /// 把已有序列加入此组，常用于在多个组之间分担所有权。
    pub fn start_existing(&mut self, handle: &CoroutineHandle) {
        self.spawner.start_existing(handle);
        self.coroutines.push(handle.clone());
    }

    /// 停止并取消记录 `handle` 的一次出现。
    pub fn stop(&mut self, handle: &CoroutineHandle) {
        if let Some(index) = self.coroutines.iter().position(|h| h == handle) {
            self.coroutines.remove(index);
        }
        self.spawner.stop(handle);
    }

    pub fn stop_all(&mut self) {
        for handle in self.coroutines.drain(..) {
            self.spawner.stop(&handle);
        }
    }

    pub fn len(&self) -> usize {
        self.coroutines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coroutines.is_empty()
    }

    pub fn handles(&self) -> &[CoroutineHandle] {
        &self.coroutines
    }
}

impl Drop for CoroutineBucket {
    fn drop(&mut self) {
        if !self.coroutines.is_empty() {
            log::debug!("Dropping bucket with {} coroutines", self.coroutines.len());
        }
        self.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        coroutine::from_iter,
        phase::Phase,
        scheduler::Scheduler,
        staller::Staller,
        stallers::WaitForTicks,
    };

    fn forever() -> impl Coroutine {
        let stallers: Vec<Box<dyn Staller>> = vec![Box::new(WaitForTicks::new(i64::MAX))];
        from_iter(stallers)
    }

    #[test]
    fn test_stop_untracks_one_occurrence() {
        let scheduler = Scheduler::default();
        let mut bucket = scheduler.bucket();
        let handle = bucket.start(forever);
        bucket.start_existing(&handle);
        assert_eq!(bucket.len(), 2);

        bucket.stop(&handle);
        assert_eq!(bucket.handles(), &[handle.clone()]);
        bucket.stop_all();
        assert!(bucket.is_empty());
    }

    #[test]
    fn test_drop_stops_tracked_coroutines() {
        let mut scheduler = Scheduler::default();
        let outside = scheduler.start(forever);
        let inside = {
            let mut bucket = scheduler.bucket();
            let handle = bucket.start(forever);
            scheduler.step_phase(&Phase::TICK);
            handle
        };
        assert!(!scheduler.is_complete(&inside));

        scheduler.step_phase(&Phase::TICK);
        assert!(scheduler.is_complete(&inside));
        assert!(!scheduler.is_complete(&outside));
    }
}
