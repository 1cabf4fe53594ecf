//! Configuration management for locallog

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::logging::{LogLevel, DEFAULT_RETENTION};

/// Smallest allowed size limit for a single log file
pub const MIN_MAX_FILE_SIZE_BYTES: u64 = 4_096;

/// Logger configuration
///
/// Fixed for the lifetime of a logger, except the console threshold which can
/// be changed through the logger itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerConfig {
    /// Directory log files are written to
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,

    /// Directory export bundles are written to
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    /// Mirror accepted lines to standard error
    #[serde(default = "default_console_enabled")]
    pub console_enabled: bool,

    /// Lowest level mirrored to the console
    #[serde(default = "default_console_minimum_level")]
    pub console_minimum_level: LogLevel,

    /// Size limit for one log file, at least 4096
    #[serde(default = "default_max_file_size_bytes")]
    pub max_file_size_bytes: u64,

    /// Files older than this are purged (default: 7 days, 0 disables purging)
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,

    /// Minimum time between opportunistic purges while logging (0 disables)
    #[serde(default = "default_auto_purge_interval_secs")]
    pub auto_purge_interval_secs: u64,

    /// Prefix for log and export file names
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

fn default_logs_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("LocalLogger")
}

fn default_export_dir() -> PathBuf {
    std::env::temp_dir()
}

fn default_console_enabled() -> bool {
    true
}

fn default_console_minimum_level() -> LogLevel {
    LogLevel::Info
}

fn default_max_file_size_bytes() -> u64 {
    1_048_576 // 1 MiB
}

fn default_retention_secs() -> u64 {
    DEFAULT_RETENTION.as_secs()
}

fn default_auto_purge_interval_secs() -> u64 {
    60
}

fn default_file_prefix() -> String {
    "sglog".to_string()
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            logs_dir: default_logs_dir(),
            export_dir: default_export_dir(),
            console_enabled: default_console_enabled(),
            console_minimum_level: default_console_minimum_level(),
            max_file_size_bytes: default_max_file_size_bytes(),
            retention_secs: default_retention_secs(),
            auto_purge_interval_secs: default_auto_purge_interval_secs(),
            file_prefix: default_file_prefix(),
        }
    }
}

impl LoggerConfig {
    /// Default configuration writing into `logs_dir`
    pub fn new(logs_dir: impl Into<PathBuf>) -> Self {
        Self {
            logs_dir: logs_dir.into(),
            ..Self::default()
        }
    }

    /// Apply floors and expand `~` in directory paths
    pub fn normalized(mut self) -> Self {
        self.max_file_size_bytes = self.max_file_size_bytes.max(MIN_MAX_FILE_SIZE_BYTES);
        self.logs_dir = expand_tilde(&self.logs_dir);
        self.export_dir = expand_tilde(&self.export_dir);
        self
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    pub fn auto_purge_interval(&self) -> Duration {
        Duration::from_secs(self.auto_purge_interval_secs)
    }

    /// Load configuration from the default file, or return default if not found
    pub fn load() -> Result<Self> {
        let path = config_file_path();
        if path.exists() {
            Self::load_from_path(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config.normalized())
    }

    /// Save configuration to a TOML file
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }
}

fn expand_tilde(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) if s.starts_with('~') => PathBuf::from(shellexpand::tilde(s).into_owned()),
        _ => path.to_path_buf(),
    }
}

/// Get the base configuration directory (~/.locallog)
/// Falls back to ./.locallog if home directory cannot be determined
pub fn config_dir() -> PathBuf {
    try_config_dir().unwrap_or_else(|| {
        tracing::warn!("Could not determine home directory, using current directory for config");
        PathBuf::from(".locallog")
    })
}

/// Try to get the base configuration directory, returning None if home dir is unavailable
pub fn try_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".locallog"))
}

/// Get the path to the config file
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}
