use std::{
    fmt::Display,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use cadence_core::SchedulerConfig;
use serde::{Deserialize, Serialize};

/// 演示宿主的配置，可以从 JSON 文件加载，命令行参数会覆盖其中的值。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub scheduler: SchedulerConfig,
    /// 最多运行的 tick 数，0 表示直到演示协程全部结束。
    pub ticks: u64,
    /// 每秒 tick 数。
    pub tick_rate: f64,
    pub frames_per_tick: u32,
    /// 不按真实时间休眠，尽快推进。
    pub fast: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        HostConfig {
            scheduler: SchedulerConfig::default(),
            ticks: 0,
            tick_rate: 20.0,
            frames_per_tick: 2,
            fast: false,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "Failed to read config '{}': {}", path.display(), source)
            }
            ConfigError::Parse { path, source } => {
                write!(f, "Failed to parse config '{}': {}", path.display(), source)
            }
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl HostConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: HostConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tick_rate.is_finite() || self.tick_rate <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "tick_rate must be a positive number, got {}",
                self.tick_rate
            )));
        }
        if Duration::try_from_secs_f64(1.0 / self.tick_rate).is_err() {
            return Err(ConfigError::Invalid(format!(
                "tick_rate {} is too small, the tick interval does not fit a Duration",
                self.tick_rate
            )));
        }
        if !self.scheduler.time_scale.is_finite() || self.scheduler.time_scale < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "time_scale must not be negative, got {}",
                self.scheduler.time_scale
            )));
        }
        Ok(())
    }

    /// 未经 `validate` 的极端速率退化为 `Duration::MAX`。
    pub fn tick_interval(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.tick_rate).unwrap_or(Duration::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::{FaultPolicy, HostRole};
    use std::io::Write;

    #[test]
    fn test_load_partial_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "ticks": 12, "scheduler": {{ "role": "server", "fault_policy": "retry" }} }}"#
        )
        .unwrap();

        let config = HostConfig::load(file.path()).unwrap();
        assert_eq!(config.ticks, 12);
        assert_eq!(config.scheduler.role, HostRole::Server);
        assert_eq!(config.scheduler.fault_policy, FaultPolicy::Retry);
        assert_eq!(config.tick_rate, 20.0);
        assert_eq!(config.frames_per_tick, 2);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let err = HostConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("missing.json"));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ ticks: ").unwrap();
        assert!(matches!(
            HostConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_rejects_non_positive_tick_rate() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "tick_rate": 0 }}"#).unwrap();
        assert!(matches!(
            HostConfig::load(file.path()),
            Err(ConfigError::Invalid(_))
        ));
        assert_eq!(
            HostConfig::default().tick_interval(),
            Duration::from_millis(50)
        );
    }

    #[test]
    fn test_rejects_tick_rate_with_unrepresentable_interval() {
        let config = HostConfig {
            tick_rate: 1e-300,
            ..HostConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        assert_eq!(config.tick_interval(), Duration::MAX);

        let slow = HostConfig {
            tick_rate: 0.5,
            ..HostConfig::default()
        };
        assert!(slow.validate().is_ok());
        assert_eq!(slow.tick_interval(), Duration::from_secs(2));
    }
}
