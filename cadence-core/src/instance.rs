use crate::{
    context::StepContext,
    coroutine::Step,
    error::CoroutineError,
    handle::{CoroutineHandle, Ticket},
    phase::Phase,
    staller::Staller,
};

/// 调度器内部的协程实例：持有一个句柄条目以及当前停顿器。
///
/// 状态只有两种：运行中（`current` 为 Some）与已结束（`current` 为 None）。
pub(crate) struct CoroutineInstance {
    ticket: Ticket,
    current: Option<Box<dyn Staller>>,
    // 最近一次具体阶段，用于解析 Preserve
    last_phase: Phase,
}

impl CoroutineInstance {
    /// 驱动序列一次以取得第一个停顿器。
    ///
    /// 序列为空时返回的实例已经处于结束状态。
    pub(crate) fn new(
        ticket: Ticket,
        default_phase: Phase,
        cx: &StepContext<'_>,
    ) -> Result<Self, CoroutineError> {
        let mut instance = CoroutineInstance {
            ticket,
            current: None,
            last_phase: default_phase,
        };
        instance.pull(cx)?;
        Ok(instance)
    }

    pub(crate) fn handle(&self) -> &CoroutineHandle {
        self.ticket.handle()
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.current.is_none()
    }

    /// 当前停顿器请求的阶段，`Preserve` 解析为上一次的具体阶段。
    pub(crate) fn current_phase(&self) -> &Phase {
        match self.current.as_ref() {
            Some(staller) => staller.desired_phase().resolve(&self.last_phase),
            None => &self.last_phase,
        }
    }

    pub(crate) fn describe_staller(&self) -> String {
        self.current
            .as_ref()
            .map(|staller| staller.describe())
            .unwrap_or_else(|| "<finished>".to_string())
    }

    /// 推进当前停顿器；完成时恢复协程体取得下一个停顿器。
    pub(crate) fn update(&mut self, cx: &StepContext<'_>) -> Result<(), CoroutineError> {
        let Some(staller) = self.current.as_mut() else {
            return Ok(());
        };
        staller.advance(cx);
        if !staller.is_complete() {
            return Ok(());
        }
        self.pull(cx)
    }

    /// 强制结束，故障策略为 Finish 时使用。
    pub(crate) fn finish(&mut self) {
        self.current = None;
    }

    fn pull(&mut self, cx: &StepContext<'_>) -> Result<(), CoroutineError> {
        match self.ticket.handle().resume(cx)? {
            Step::Done => self.current = None,
            Step::Stall(staller) => {
                if let Some(phase) = staller.desired_phase().concrete() {
                    self.last_phase = phase.clone();
                }
                self.current = Some(staller);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::Clock,
        coroutine::{from_fn, from_iter},
        phase::HostRole,
        scheduler::Spawner,
        stallers::{WaitForNextPhase, WaitForTicks, WaitUntil},
    };

    fn instance_of(
        spawner: &Spawner,
        cx: &StepContext<'_>,
        stallers: Vec<Box<dyn Staller>>,
    ) -> CoroutineInstance {
        let handle = spawner.start(move || from_iter(stallers));
        let ticket = spawner
            .take_additions()
            .into_iter()
            .find(|ticket| ticket.handle() == &handle)
            .unwrap();
        CoroutineInstance::new(ticket, Phase::TICK, cx).unwrap()
    }

    #[test]
    fn test_empty_sequence_finishes_at_construction() {
        let clock = Clock::default();
        let spawner = Spawner::new();
        let cx = StepContext::new(&Phase::TICK, &clock, HostRole::Client, &spawner);

        let instance = instance_of(&spawner, &cx, vec![]);
        assert!(instance.is_finished());
    }

    #[test]
    fn test_update_walks_the_sequence() {
        let clock = Clock::default();
        let spawner = Spawner::new();
        let cx = StepContext::new(&Phase::TICK, &clock, HostRole::Client, &spawner);

        let mut instance = instance_of(
            &spawner,
            &cx,
            vec![Box::new(WaitForTicks::new(2)), Box::new(WaitForTicks::new(1))],
        );
        instance.update(&cx).unwrap();
        assert!(!instance.is_finished());
        instance.update(&cx).unwrap();
        assert!(!instance.is_finished());
        instance.update(&cx).unwrap();
        assert!(instance.is_finished());
        // 已结束的实例再次推进是空操作
        instance.update(&cx).unwrap();
        assert!(instance.is_finished());
    }

    #[test]
    fn test_preserve_uses_last_concrete_phase() {
        let clock = Clock::default();
        let spawner = Spawner::new();
        let late = Phase::named("late");
        let cx = StepContext::new(&late, &clock, HostRole::Client, &spawner);

        let mut instance = instance_of(
            &spawner,
            &cx,
            vec![
                Box::new(WaitUntil::new(|| true)),
                Box::new(WaitForNextPhase::new(late.clone(), HostRole::Client).unwrap()),
                Box::new(WaitUntil::new(|| true)),
            ],
        );
        // 尚无具体阶段时使用默认阶段
        assert_eq!(instance.current_phase(), &Phase::TICK);
        instance.update(&cx).unwrap();
        assert_eq!(instance.current_phase(), &late);
        instance.update(&cx).unwrap();
        assert_eq!(instance.current_phase(), &late);
        instance.update(&cx).unwrap();
        assert!(instance.is_finished());
    }

    #[test]
    fn test_body_error_leaves_staller_in_place() {
        let clock = Clock::default();
        let spawner = Spawner::new();
        let cx = StepContext::new(&Phase::TICK, &clock, HostRole::Client, &spawner);

        let mut calls = 0;
        let handle = spawner.start(move || {
            from_fn(move |_cx| {
                calls += 1;
                if calls == 1 {
                    Ok(Step::stall(WaitForTicks::new(1)))
                } else {
                    Err(CoroutineError::failed("bad state"))
                }
            })
        });
        let ticket = spawner.take_additions().pop_front().unwrap();
        assert_eq!(ticket.handle(), &handle);

        let mut instance = CoroutineInstance::new(ticket, Phase::TICK, &cx).unwrap();
        assert!(instance.update(&cx).is_err());
        assert!(!instance.is_finished());
        instance.finish();
        assert!(instance.is_finished());
        assert_eq!(instance.describe_staller(), "<finished>");
    }
}
