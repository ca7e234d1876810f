//! Configuration system for Sendplan.
//!
//! A single YAML file covers logging, the database location and the
//! scheduling pass bounds. Every field has a default, so a missing file
//! is not an error.

use eyre::Result;
use std::path::PathBuf;

pub use self::global::{DEFAULT_WINDOW_DAYS, GlobalConfig, MAX_WINDOW_DAYS, SchedulerConfig, StorageConfig};

mod global;

/// Load and validate configuration from the standard search paths.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. .sendplan.yml in current directory (project config)
/// 3. ~/.config/sendplan/sendplan.yml (user config)
/// 4. Default values
pub fn load_config(explicit_path: Option<&PathBuf>) -> Result<GlobalConfig> {
    let config = GlobalConfig::load(explicit_path)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_rejects_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.yml");
        std::fs::write(&path, "scheduler:\n  max-window-days: 0\n").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }
}
