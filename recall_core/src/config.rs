//! Configuration file support for Recall.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/recall/config.toml`. Every
//! section and field is optional.

use crate::classifier::MasteryThresholds;
use crate::types::MIN_EASE_FACTOR;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub mastery: MasteryThresholds,
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

impl DataConfig {
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join("cards.json")
    }

    pub fn review_log_path(&self) -> PathBuf {
        self.data_dir.join("reviews.wal")
    }
}

/// Practice session sizes
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_quiz_size")]
    pub quiz_size: usize,

    #[serde(default = "default_challenge_limit")]
    pub challenge_limit: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            quiz_size: default_quiz_size(),
            challenge_limit: default_challenge_limit(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("recall")
}

fn default_quiz_size() -> usize {
    10
}

fn default_challenge_limit() -> usize {
    20
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject settings the engine cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.session.quiz_size == 0 {
            return Err(Error::Config("session.quiz_size must be at least 1".into()));
        }
        if self.session.challenge_limit == 0 {
            return Err(Error::Config(
                "session.challenge_limit must be at least 1".into(),
            ));
        }
        if self.mastery.min_ease_factor < MIN_EASE_FACTOR {
            return Err(Error::Config(format!(
                "mastery.min_ease_factor must be at least {}",
                MIN_EASE_FACTOR
            )));
        }
        if self.mastery.min_interval_days == 0 {
            return Err(Error::Config(
                "mastery.min_interval_days must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("recall").join("config.toml")
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
        assert_eq!(config.session.quiz_size, 10);
        assert_eq!(config.session.challenge_limit, 20);
        assert_eq!(config.mastery, MasteryThresholds::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[session]
quiz_size = 5

[mastery]
min_interval_days = 30
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.session.quiz_size, 5);
        assert_eq!(config.session.challenge_limit, 20); // default
        assert_eq!(config.mastery.min_interval_days, 30);
        assert_eq!(config.mastery.min_repetitions, 3); // default
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.data.data_dir = temp_dir.path().join("data");
        config.session.challenge_limit = 12;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.session.challenge_limit, 12);
        assert_eq!(loaded.data.data_dir, temp_dir.path().join("data"));
        assert_eq!(
            loaded.data.store_path(),
            temp_dir.path().join("data").join("cards.json")
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[mastery]\nmin_ease_factor = 1.0\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }
}
