//! 调度器本体。
//!
//! 调度器只在一个线程上被推进。宿主在每次阶段出现时调用一次 `step_phase`，
//! 每次调用按顺序执行四步：
//!
//! 1. 推进活跃集合中当前阶段等于本阶段的实例，结束的实例排入移除队列
//! 2. 排空加入队列（包括排空过程中新启动的协程），构造实例并按阶段放入等待表
//! 3. 把等待表中本阶段的实例移入活跃集合
//! 4. 排空移除队列，每个请求移除一个实例
//!
//! 第 2 步加入的协程最早在下一次本阶段出现时才会被推进。

use std::panic::{self, AssertUnwindSafe};

use rustc_hash::FxHashMap;

use crate::{
    bucket::CoroutineBucket,
    clock::Clock,
    config::{FaultPolicy, SchedulerConfig},
    context::{SimulationFrame, StepContext},
    coroutine::Coroutine,
    error::CoroutineError,
    handle::CoroutineHandle,
    instance::CoroutineInstance,
    phase::{HostRole, Phase},
};

use super::{
    report::{FaultKind, FaultReport, StepReport},
    spawner::Spawner,
};

/// 从调度器线程观察到的句柄状态。
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum CoroutineStatus {
    QueuedForAdd,
    /// 已构造，等待指定阶段出现后进入活跃集合。
    Pending(Phase),
    Active,
    QueuedForRemove,
    /// 未知句柄，或已经结束。
    Unknown,
}

pub struct Scheduler {
    config: SchedulerConfig,
    spawner: Spawner,
    active: Vec<CoroutineInstance>,
    pending: FxHashMap<Phase, Vec<CoroutineInstance>>,
    clock: Clock,
    role: HostRole,
    simulation: Option<SimulationFrame>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        log::debug!(
            "Creating scheduler (role: {}, default phase: '{}', fault policy: {:?})",
            config.role,
            config.default_phase,
            config.fault_policy
        );
        Scheduler {
            clock: Clock::new(config.time_scale),
            role: config.role,
            spawner: Spawner::new(),
            active: Vec::new(),
            pending: FxHashMap::default(),
            simulation: None,
            config,
        }
    }

    pub fn start<C, P>(&self, producer: P) -> CoroutineHandle
    where
        C: Coroutine + 'static,
        P: FnOnce() -> C,
    {
        self.spawner.start(producer)
    }

    pub fn start_with<A, C, P>(&self, producer: P, args: A) -> CoroutineHandle
    where
        C: Coroutine + 'static,
        P: FnOnce(A) -> C,
    {
        self.spawner.start_with(producer, args)
    }

    pub fn start_existing(&self, handle: &CoroutineHandle) {
        self.spawner.start_existing(handle)
    }

    pub fn stop(&self, handle: &CoroutineHandle) {
        self.spawner.stop(handle)
    }

    /// 停止所有活跃、等待中以及尚未加入的协程。
    pub fn stop_all(&self) {
        let handles: Vec<CoroutineHandle> = self
            .active
            .iter()
            .chain(self.pending.values().flatten())
            .map(|instance| instance.handle().clone())
            .chain(self.spawner.queued_handles())
            .collect();
        log::debug!("Stopping {} coroutine entries", handles.len());
        for handle in &handles {
            self.spawner.stop(handle);
        }
    }

    /// 句柄不在任何调度器的加入队列、等待表或活跃集合中时为 true。
    ///
    /// 从未启动的句柄视为完成。完成状态属于句柄本身，
    /// 同一序列被多个调度器加入时，全部移除后才算完成。
    pub fn is_complete(&self, handle: &CoroutineHandle) -> bool {
        handle.is_complete()
    }

    pub fn status(&self, handle: &CoroutineHandle) -> CoroutineStatus {
        if self.spawner.is_queued_for_remove(handle) {
            return CoroutineStatus::QueuedForRemove;
        }
        if self.active.iter().any(|instance| instance.handle() == handle) {
            return CoroutineStatus::Active;
        }
        let pending_phase = self.pending.iter().find_map(|(phase, bucket)| {
            bucket
                .iter()
                .any(|instance| instance.handle() == handle)
                .then(|| phase.clone())
        });
        if let Some(phase) = pending_phase {
            return CoroutineStatus::Pending(phase);
        }
        if self.spawner.is_queued_for_add(handle) {
            return CoroutineStatus::QueuedForAdd;
        }
        CoroutineStatus::Unknown
    }

    /// 处理一次 `phase` 的出现。
    pub fn step_phase(&mut self, phase: &Phase) -> StepReport {
        let mut report = StepReport::new(phase.clone());
        self.advance_active(phase, &mut report);
        self.admit_queued(phase, &mut report);
        self.activate_pending(phase, &mut report);
        self.apply_removals(&mut report);
        report
    }

    fn advance_active(&mut self, phase: &Phase, report: &mut StepReport) {
        let cx = StepContext::new(phase, &self.clock, self.role, &self.spawner)
            .with_simulation(self.simulation.as_ref());

        for instance in self.active.iter_mut() {
            if instance.is_finished() || instance.current_phase() != phase {
                continue;
            }
            report.advanced += 1;

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| instance.update(&cx)))
                .unwrap_or_else(|payload| Err(CoroutineError::from_panic(payload)));
            if let Err(error) = outcome {
                let context = format!(
                    "{} at {}",
                    instance.handle().format_context(),
                    instance.describe_staller()
                );
                record_fault(
                    report,
                    instance.handle(),
                    context,
                    phase,
                    FaultKind::Advance,
                    error,
                );
                if self.config.fault_policy == FaultPolicy::Finish {
                    instance.finish();
                }
            }

            if instance.is_finished() {
                report.finished += 1;
                self.spawner.stop(instance.handle());
            }
        }
    }

    fn admit_queued(&mut self, phase: &Phase, report: &mut StepReport) {
        loop {
            let additions = self.spawner.take_additions();
            if additions.is_empty() {
                break;
            }

            for ticket in additions {
                let handle = ticket.handle().clone();
                if !self.tracks(&handle) && self.spawner.consume_removal(&handle) {
                    log::debug!("Coroutine #{} was stopped before admission", handle.id());
                    report.discarded += 1;
                    continue;
                }

                let cx = StepContext::new(phase, &self.clock, self.role, &self.spawner)
                    .with_simulation(self.simulation.as_ref());
                let default_phase = self.config.default_phase.clone();
                let admitted = panic::catch_unwind(AssertUnwindSafe(|| {
                    CoroutineInstance::new(ticket, default_phase, &cx)
                }))
                .unwrap_or_else(|payload| Err(CoroutineError::from_panic(payload)));

                match admitted {
                    Ok(instance) if instance.is_finished() => {
                        log::debug!("Coroutine #{} finished on admission", handle.id());
                        report.discarded += 1;
                    }
                    Ok(instance) => {
                        let target = instance.current_phase().clone();
                        log::debug!(
                            "Admitted coroutine #{}, pending on '{}'",
                            handle.id(),
                            target
                        );
                        self.pending.entry(target).or_default().push(instance);
                        report.admitted += 1;
                    }
                    Err(error) => {
                        record_fault(
                            report,
                            &handle,
                            handle.format_context(),
                            phase,
                            FaultKind::Admission,
                            error,
                        );
                        report.discarded += 1;
                    }
                }
            }
        }
    }

    fn activate_pending(&mut self, phase: &Phase, report: &mut StepReport) {
        if let Some(batch) = self.pending.remove(phase) {
            report.activated += batch.len();
            self.active.extend(batch);
        }
    }

    fn apply_removals(&mut self, report: &mut StepReport) {
        // 尚在加入队列中的句柄要等到加入之后再移除
        let mut deferred = Vec::new();
        loop {
            let removals = self.spawner.take_removals();
            if removals.is_empty() {
                break;
            }

            for handle in removals {
                if self.remove_instance(&handle) {
                    log::debug!("Removed coroutine #{}", handle.id());
                    report.removed += 1;
                } else if self.spawner.is_queued_for_add(&handle) {
                    deferred.push(handle);
                } else if handle.is_complete() {
                    log::debug!("Ignoring stop of completed coroutine #{}", handle.id());
                } else {
                    log::warn!(
                        "Ignoring stop of coroutine #{}, it is not owned by this scheduler",
                        handle.id()
                    );
                }
            }
        }
        if !deferred.is_empty() {
            self.spawner.defer_removals(deferred);
        }
        self.pending.retain(|_, bucket| !bucket.is_empty());
    }

    /// 依次优先移除：已结束的活跃实例、任意活跃实例、等待中的实例。
    fn remove_instance(&mut self, handle: &CoroutineHandle) -> bool {
        let position = self
            .active
            .iter()
            .position(|instance| instance.is_finished() && instance.handle() == handle)
            .or_else(|| {
                self.active
                    .iter()
                    .position(|instance| instance.handle() == handle)
            });
        if let Some(index) = position {
            self.active.remove(index);
            return true;
        }

        for bucket in self.pending.values_mut() {
            if let Some(index) = bucket.iter().position(|instance| instance.handle() == handle) {
                bucket.remove(index);
                return true;
            }
        }
        false
    }

    fn tracks(&self, handle: &CoroutineHandle) -> bool {
        self.active
            .iter()
            .chain(self.pending.values().flatten())
            .any(|instance| instance.handle() == handle)
    }

    /// 丢弃所有实例与排队中的请求。
    pub fn clear(&mut self) {
        let pending: usize = self.pending.values().map(Vec::len).sum();
        let queued = self.spawner.take_additions();
        log::debug!(
            "Clearing scheduler ({} active, {} pending, {} queued)",
            self.active.len(),
            pending,
            queued.len()
        );
        drop(queued);
        self.spawner.take_removals();
        self.active.clear();
        self.pending.clear();
    }

    /// 关闭调度器：之后通过任何 `Spawner` 发出的请求都会被忽略。
    pub fn shutdown(self) {
        log::info!(
            "Shutting down scheduler with {} active and {} pending coroutines",
            self.active_len(),
            self.pending_len()
        );
        drop(self);
    }

    pub fn spawner(&self) -> &Spawner {
        &self.spawner
    }

    /// 创建绑定到此调度器的协程组。
    pub fn bucket(&self) -> CoroutineBucket {
        CoroutineBucket::new(self.spawner.clone())
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    pub fn role(&self) -> HostRole {
        self.role
    }

    pub fn set_role(&mut self, role: HostRole) {
        if role != self.role {
            log::info!("Host role changed from {} to {}", self.role, role);
            self.role = role;
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// 设置下一次推进时提供给停顿器的模拟信息。
    pub fn set_simulation(&mut self, simulation: Option<SimulationFrame>) {
        self.simulation = simulation;
    }

    pub fn simulation(&self) -> Option<&SimulationFrame> {
        self.simulation.as_ref()
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Scheduler::new(SchedulerConfig::default())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.spawner.close();
        self.clear();
    }
}

fn record_fault(
    report: &mut StepReport,
    handle: &CoroutineHandle,
    context: String,
    phase: &Phase,
    kind: FaultKind,
    error: CoroutineError,
) {
    let fault = FaultReport {
        handle: handle.clone(),
        context,
        phase: phase.clone(),
        kind,
        error,
    };
    log::error!("{}", fault);
    report.faults.push(fault);
}
