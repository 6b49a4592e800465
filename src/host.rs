//! 玩具宿主循环。
//!
//! 每个 tick 先用实测经过的时间推进时钟，然后依次处理 tick、输入模拟和若干渲染帧。
//! `tick_rate` 只决定两次 tick 之间的休眠。服务端角色没有渲染帧。

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    time::Instant,
};

use cadence_core::{Phase, Scheduler, SimulationFrame, StepReport};
use colored::*;

use crate::config::HostConfig;

pub struct HostLoop {
    scheduler: Scheduler,
    config: HostConfig,
    tick: u64,
    last_tick: Instant,
    running: Arc<AtomicBool>,
}

impl HostLoop {
    pub fn new(config: HostConfig) -> Self {
        HostLoop {
            scheduler: Scheduler::new(config.scheduler.clone()),
            config,
            tick: 0,
            last_tick: Instant::now(),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// 清除后循环在当前 tick 结束时退出，供 Ctrl-C 处理器使用。
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// 运行一个完整的 tick，返回各阶段的推进报告。
    pub fn run_tick(&mut self) -> Vec<StepReport> {
        self.tick += 1;
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_tick);
        self.last_tick = now;
        self.scheduler.clock_mut().advance(elapsed);

        let mut reports = Vec::new();
        reports.push(self.scheduler.step_phase(&Phase::TICK));

        // 合成的输入模拟：轮流模拟三个客户端，隔一次是预测重放
        self.scheduler.set_simulation(Some(SimulationFrame {
            client: self.tick % 3,
            first_time: self.tick % 2 == 1,
        }));
        reports.push(self.scheduler.step_phase(&Phase::SIMULATE));
        self.scheduler.set_simulation(None);

        if self.scheduler.role().supports(&Phase::FRAME) {
            for _ in 0..self.config.frames_per_tick {
                reports.push(self.scheduler.step_phase(&Phase::FRAME));
            }
        }
        reports
    }

    /// 循环直到达到 tick 上限、`after_tick` 返回 false 或运行标志被清除。
    ///
    /// 返回执行的 tick 数。
    pub fn run<F>(&mut self, mut after_tick: F) -> u64
    where
        F: FnMut(u64, &Scheduler) -> bool,
    {
        let interval = self.config.tick_interval();
        self.last_tick = Instant::now();
        while self.running.load(Ordering::SeqCst) {
            if self.config.ticks != 0 && self.tick >= self.config.ticks {
                log::info!("Reached tick limit {}", self.config.ticks);
                break;
            }

            for report in self.run_tick() {
                for fault in &report.faults {
                    println!("{} {}", "fault".red().bold(), fault);
                }
            }

            if !after_tick(self.tick, &self.scheduler) {
                break;
            }
            if !self.config.fast {
                thread::sleep(interval);
            }
        }
        self.tick
    }

    pub fn shutdown(self) {
        log::info!("Host loop stopped after {} ticks", self.tick);
        self.scheduler.shutdown();
    }
}
