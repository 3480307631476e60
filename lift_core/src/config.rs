//! Configuration file support for Liftlog.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/liftlog/config.toml`.

use crate::{Error, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Largest UTC offset accepted, in minutes (UTC+14:00)
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub time: TimeConfig,

    #[serde(default)]
    pub query: QueryConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Input limits applied by the mutation service
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_max_notes_chars")]
    pub max_notes_chars: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_notes_chars: default_max_notes_chars(),
        }
    }
}

/// Caller-local time used for calendar-day queries
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct TimeConfig {
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl TimeConfig {
    pub fn utc_offset(&self) -> Result<FixedOffset> {
        if self.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(Error::Config(format!(
                "utc_offset_minutes {} is outside ±{}",
                self.utc_offset_minutes, MAX_OFFSET_MINUTES
            )));
        }
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            Error::Config(format!("invalid utc_offset_minutes {}", self.utc_offset_minutes))
        })
    }
}

/// Listing defaults
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct QueryConfig {
    #[serde(default)]
    pub default_recent_limit: Option<usize>,
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        PathBuf::from(home).join(".local/share")
    });
    base.join("liftlog")
}

fn default_max_notes_chars() -> usize {
    2000
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {:?}: {}", path, e)))?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.validation.max_notes_chars == 0 {
            return Err(Error::Config("max_notes_chars must be positive".into()));
        }
        if self.query.default_recent_limit == Some(0) {
            return Err(Error::Config("default_recent_limit must be positive".into()));
        }
        self.time.utc_offset()?;
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            PathBuf::from(home).join(".config")
        });
        base.join("liftlog").join("config.toml")
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.validation.max_notes_chars, 2000);
        assert_eq!(config.time.utc_offset_minutes, 0);
        assert_eq!(config.query.default_recent_limit, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("liftlog/config.toml");

        let mut config = Config::default();
        config.time.utc_offset_minutes = -300;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.time.utc_offset_minutes, -300);
        assert_eq!(
            loaded.time.utc_offset().unwrap(),
            FixedOffset::west_opt(5 * 3600).unwrap()
        );
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[validation]
max_notes_chars = 500
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.validation.max_notes_chars, 500);
        assert_eq!(config.time.utc_offset_minutes, 0); // default
    }

    #[test]
    fn test_out_of_range_offset_rejected() {
        let toml_str = r#"
[time]
utc_offset_minutes = 900
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
