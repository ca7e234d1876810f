//! Global configuration.
//!
//! Loaded from ~/.config/sendplan/sendplan.yml or .sendplan.yml

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::scheduler::{DEFAULT_MAX_FORWARD_DAYS, PassLimits};

/// Days a range request covers when none is given.
pub const DEFAULT_WINDOW_DAYS: usize = 2;

/// Upper bound on a range request.
pub const MAX_WINDOW_DAYS: usize = 60;

/// Global configuration for Sendplan.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Log level (off, error, warn, info, debug, trace). RUST_LOG wins.
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Storage settings.
    pub storage: StorageConfig,

    /// Scheduling pass settings.
    pub scheduler: SchedulerConfig,
}

impl GlobalConfig {
    /// Load configuration with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. .sendplan.yml in current directory
    /// 3. ~/.config/sendplan/sendplan.yml
    /// 4. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let mut search = vec![PathBuf::from(".sendplan.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            search.push(config_dir.join("sendplan").join("sendplan.yml"));
        }
        Self::load_first_existing(&search)
    }

    /// Load the first file in `search` that exists.
    ///
    /// A file that exists but does not parse is an error; later files and
    /// defaults are only used when earlier files are absent.
    fn load_first_existing(search: &[PathBuf]) -> Result<Self> {
        for path in search {
            if path.exists() {
                let config =
                    Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()))?;
                log::info!("Loaded config from {}", path.display());
                return Ok(config);
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if let Some(level) = &self.log_level
            && level.parse::<log::LevelFilter>().is_err()
        {
            eyre::bail!("log-level '{}' is not one of off, error, warn, info, debug, trace", level);
        }

        let scheduler = &self.scheduler;
        if scheduler.default_window_days == 0 {
            eyre::bail!("scheduler.default-window-days must be > 0");
        }
        if scheduler.max_window_days == 0 {
            eyre::bail!("scheduler.max-window-days must be > 0");
        }
        if scheduler.default_window_days > scheduler.max_window_days {
            eyre::bail!(
                "scheduler.default-window-days ({}) exceeds scheduler.max-window-days ({})",
                scheduler.default_window_days,
                scheduler.max_window_days
            );
        }
        if scheduler.max_forward_days == 0 {
            eyre::bail!("scheduler.max-forward-days must be > 0");
        }
        Ok(())
    }
}

/// Storage settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file.
    #[serde(rename = "db-path")]
    pub db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let default_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sendplan");

        Self {
            db_path: default_dir.join("sendplan.db"),
        }
    }
}

/// Scheduling pass settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    #[serde(rename = "default-window-days")]
    pub default_window_days: usize,

    #[serde(rename = "max-window-days")]
    pub max_window_days: usize,

    /// Weekdays a stage may walk past the window before deferring.
    #[serde(rename = "max-forward-days")]
    pub max_forward_days: usize,
}

impl SchedulerConfig {
    /// Clamp a requested day count into `[1, max_window_days]`.
    pub fn window_days(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_window_days)
            .clamp(1, self.max_window_days.max(1))
    }

    pub fn pass_limits(&self) -> PassLimits {
        PassLimits {
            max_forward_days: self.max_forward_days,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_window_days: DEFAULT_WINDOW_DAYS,
            max_window_days: MAX_WINDOW_DAYS,
            max_forward_days: DEFAULT_MAX_FORWARD_DAYS,
        }
    }
}
