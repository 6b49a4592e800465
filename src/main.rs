mod config;
mod demo;
mod host;

use std::{
    path::PathBuf,
    process::ExitCode,
    str::FromStr,
    sync::atomic::Ordering,
};

use cadence_core::HostRole;
use clap::Parser;
use colored::*;

use crate::{config::HostConfig, demo::Demo, host::HostLoop};

#[derive(Parser, Debug)]
#[command(name = "cadence")]
#[command(version, about = "Runs a toy host loop that drives phase-scheduled coroutines")]
struct Args {
    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Host role: client, menu or server
    #[arg(long, value_parser = parse_role)]
    role: Option<HostRole>,

    /// Stop after this many ticks (0 runs until the demo finishes)
    #[arg(long)]
    ticks: Option<u64>,

    /// Ticks per second
    #[arg(long)]
    tick_rate: Option<f64>,

    /// Render frames stepped after every tick
    #[arg(long)]
    frames_per_tick: Option<u32>,

    /// Game time scale
    #[arg(long)]
    time_scale: Option<f64>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Do not sleep between ticks
    #[arg(long)]
    fast: bool,
}

fn parse_role(value: &str) -> Result<HostRole, String> {
    match value.to_ascii_lowercase().as_str() {
        "client" => Ok(HostRole::Client),
        "menu" => Ok(HostRole::Menu),
        "server" => Ok(HostRole::Server),
        other => Err(format!("unknown role '{}'", other)),
    }
}

impl Args {
    fn host_config(&self) -> Result<HostConfig, config::ConfigError> {
        let mut config = match &self.config {
            Some(path) => HostConfig::load(path)?,
            None => HostConfig::default(),
        };
        if let Some(role) = self.role {
            config.scheduler.role = role;
        }
        if let Some(ticks) = self.ticks {
            config.ticks = ticks;
        }
        if let Some(tick_rate) = self.tick_rate {
            config.tick_rate = tick_rate;
        }
        if let Some(frames) = self.frames_per_tick {
            config.frames_per_tick = frames;
        }
        if let Some(time_scale) = self.time_scale {
            config.scheduler.time_scale = time_scale;
        }
        config.fast |= self.fast;
        config.validate()?;
        Ok(config)
    }
}

fn init_logging(level: &str) {
    let filter = log::LevelFilter::from_str(level).unwrap_or(log::LevelFilter::Warn);
    env_logger::Builder::new()
        .filter_level(filter)
        .parse_default_env()
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = match args.host_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{} Failed to start tokio runtime: {}", "error:".red().bold(), e);
            return ExitCode::FAILURE;
        }
    };

    println!(
        "{} role: {}, {} ticks/s, {} frames/tick",
        "cadence".green().bold(),
        config.scheduler.role,
        config.tick_rate,
        config.frames_per_tick
    );

    let mut host = HostLoop::new(config);
    let running = host.running_flag();
    if let Err(e) = ctrlc::set_handler(move || {
        println!("{}", "Ctrl+C received, stopping after this tick...".yellow());
        running.store(false, Ordering::SeqCst);
    }) {
        log::warn!("Failed to install Ctrl-C handler: {}", e);
    }

    let mut demo = Demo::start(host.scheduler(), runtime);
    let ticks = host.run(|tick, _| demo.after_tick(tick));

    let summary = if demo.is_finished() {
        "all demo coroutines finished".green()
    } else {
        "stopped before the demo finished".yellow()
    };
    println!("{} after {} ticks", summary, ticks);

    host.shutdown();
    ExitCode::SUCCESS
}
