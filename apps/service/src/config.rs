use std::time::Duration;
use std::{env, fmt, fs, path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::monitoring::{SchedulerConfig, UPTIME_WINDOW};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFailed { path: path::PathBuf, source: std::io::Error },
    #[error("Failed to write config file {path}: {source}")]
    WriteFailed { path: path::PathBuf, source: std::io::Error },
    #[error("Failed to parse config file: {0}")]
    ParseFailed(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
    #[error("No config directory found; set XDG_CONFIG_HOME or HOME")]
    ConfigPathUnavailable,
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseSection,
    pub scheduler: SchedulerSection,
    pub retention: RetentionSection,
    pub server: ServerSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// Path of the LibSQL database file
    pub path: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self { path: "sitewatch.db".into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSection {
    pub tick_seconds: u64,
    pub max_concurrent_probes: usize,
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self { tick_seconds: 60, max_concurrent_probes: 16 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionSection {
    /// Check logs kept per monitor; never less than the uptime window
    pub keep_last_per_monitor: usize,
    pub cleanup_interval_seconds: u64,
}

impl Default for RetentionSection {
    fn default() -> Self {
        Self { keep_last_per_monitor: 1000, cleanup_interval_seconds: 3600 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: String,
    pub port: u16,
    /// Accept monitors pointing at loopback or private networks
    pub allow_private_targets: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self { bind: "0.0.0.0".into(), port: 8080, allow_private_targets: false }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Default filter when RUST_LOG is unset
    pub level: String,
    /// `compact` or `json`
    pub format: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self { level: "info".into(), format: "compact".into() }
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/sitewatch/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, ConfigError> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(ConfigError::ConfigPathUnavailable);
    };

    Ok(path.join("sitewatch/config.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Internal Configuration State:")?;
        write_title_1(f, "Database")?;
        write_1(f, "Path", &self.database.path)?;
        write_title_1(f, "Scheduler")?;
        write_1(f, "Tick (s)", &self.scheduler.tick_seconds)?;
        write_1(f, "Max Concurrent Probes", &self.scheduler.max_concurrent_probes)?;
        write_title_1(f, "Retention")?;
        write_1(f, "Keep Last Per Monitor", &self.retention.keep_last_per_monitor)?;
        write_1(f, "Cleanup Interval (s)", &self.retention.cleanup_interval_seconds)?;
        write_title_1(f, "Server")?;
        write_1(f, "Bind Address", &self.server.bind)?;
        write_1(f, "Port", &self.server.port)?;
        write_1(f, "Allow Private Targets", &self.server.allow_private_targets)?;
        write_title_1(f, "Logging")?;
        write_1(f, "Level", &self.logging.level)?;
        write_1(f, "Format", &self.logging.format)?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/sitewatch/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    ///
    /// ```rust,no_run
    /// use sitewatch_service::config::Config;
    ///
    /// let cfg = Config::from_config(None::<&std::path::Path>)?;
    /// println!("{}", cfg);
    /// # Ok::<(), sitewatch_service::config::ConfigError>(())
    /// ```
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, ConfigError> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        let config = if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|source| ConfigError::ReadFailed { path: config_path.clone(), source })?;
            toml::from_str(raw_string.as_str())?
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            config
        };

        config.validate()?;
        Ok(config)
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), ConfigError> {
        let config_str: String = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| ConfigError::WriteFailed { path: path.to_path_buf(), source })?;
        }

        fs::write(path, config_str)
            .map_err(|source| ConfigError::WriteFailed { path: path.to_path_buf(), source })
    }

    /// Reject values the service cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.tick_seconds == 0 {
            return Err(ConfigError::Invalid("scheduler.tick_seconds must be positive".into()));
        }
        if self.scheduler.max_concurrent_probes == 0 {
            return Err(ConfigError::Invalid(
                "scheduler.max_concurrent_probes must be positive".into(),
            ));
        }
        if self.retention.cleanup_interval_seconds == 0 {
            return Err(ConfigError::Invalid(
                "retention.cleanup_interval_seconds must be positive".into(),
            ));
        }
        if self.logging.format.parse::<logger::LogFormat>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "logging.format must be compact or json, got {}",
                self.logging.format
            )));
        }
        Ok(())
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            tick: Duration::from_secs(self.scheduler.tick_seconds),
            max_concurrent_probes: self.scheduler.max_concurrent_probes,
        }
    }

    /// Log retention count, raised to the uptime window when set lower
    pub fn keep_last_per_monitor(&self) -> usize {
        self.retention.keep_last_per_monitor.max(UPTIME_WINDOW)
    }

    pub fn log_format(&self) -> logger::LogFormat {
        self.logging.format.parse().unwrap_or_default()
    }

    pub fn log_level(&self) -> logger::LevelFilter {
        self.logging.level.parse().unwrap_or(logger::LevelFilter::INFO)
    }
}
