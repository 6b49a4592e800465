use crate::{
    clock::Clock,
    phase::{HostRole, Phase},
    scheduler::Spawner,
};

/// 输入模拟的客户端标识，由宿主分配。
pub type ClientId = u64;

/// 宿主在推进 `Phase::SIMULATE` 之前提供的模拟信息。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulationFrame {
    pub client: ClientId,
    /// 是否为该输入的首次模拟（预测重放时为 false）。
    pub first_time: bool,
}

/// 协程体与停顿器在被推进时看到的上下文。
///
/// 只在调度器所在线程上、一次 `step_phase` 调用内部存在。
pub struct StepContext<'a> {
    phase: &'a Phase,
    clock: &'a Clock,
    role: HostRole,
    simulation: Option<&'a SimulationFrame>,
    spawner: &'a Spawner,
}

impl<'a> StepContext<'a> {
    pub fn new(phase: &'a Phase, clock: &'a Clock, role: HostRole, spawner: &'a Spawner) -> Self {
        StepContext {
            phase,
            clock,
            role,
            simulation: None,
            spawner,
        }
    }

    pub fn with_simulation(mut self, simulation: Option<&'a SimulationFrame>) -> Self {
        self.simulation = simulation;
        self
    }

    /// 当前正在推进的阶段。
    pub fn phase(&self) -> &Phase {
        self.phase
    }

    pub fn clock(&self) -> &Clock {
        self.clock
    }

    pub fn role(&self) -> HostRole {
        self.role
    }

    pub fn simulation(&self) -> Option<&SimulationFrame> {
        self.simulation
    }

    /// 用于在协程体内部启动或停止其他协程。
    pub fn spawner(&self) -> &Spawner {
        self.spawner
    }
}
