//! Configuration management for specwizard.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hunt::HuntMode;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "specwizard";

/// Default product dataset file name.
const DATASET_FILE_NAME: &str = "products.db";

/// Default hunt step store file name.
const HUNT_FILE_NAME: &str = "hunt.db";

/// Upper bound for the dataset re-attempt delay.
const MAX_RETRY_DELAY_MS: u64 = 10_000;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `SPECWIZARD_`, `__` between section and key)
/// 2. TOML config file at `~/.config/specwizard/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Product dataset configuration.
    pub dataset: DatasetConfig,
    /// Result rendering configuration.
    pub display: DisplayConfig,
    /// Treasure hunt configuration.
    pub hunt: HuntConfig,
}

/// Product dataset configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Path to the dataset file.
    /// Defaults to `~/.local/share/specwizard/products.db`
    pub path: Option<PathBuf>,
    /// Delay before the single re-attempt when the dataset is missing.
    pub retry_delay_ms: u64,
}

/// Result rendering configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Text shown in place of a missing price.
    pub price_placeholder: String,
    /// Suffix appended to rendered prices (e.g. `" NOK"`).
    pub currency: String,
    /// Also render the "products without the selected specs" panel.
    pub show_inverted: bool,
}

/// Treasure hunt configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HuntConfig {
    /// Path to the step store.
    /// Defaults to `~/.local/share/specwizard/hunt.db`
    pub database_path: Option<PathBuf>,
    /// Order in which clues are handed out.
    pub mode: HuntMode,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: None,
            retry_delay_ms: 100,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            price_placeholder: "-".to_string(),
            currency: String::new(),
            show_inverted: false,
        }
    }
}

impl Default for HuntConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            mode: HuntMode::Sequential,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("SPECWIZARD_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.dataset.retry_delay_ms > MAX_RETRY_DELAY_MS {
            return Err(Error::ConfigValidation {
                message: format!(
                    "retry_delay_ms ({}) cannot exceed {MAX_RETRY_DELAY_MS}",
                    self.dataset.retry_delay_ms
                ),
            });
        }

        if self.display.price_placeholder.is_empty() {
            return Err(Error::ConfigValidation {
                message: "price_placeholder must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Get the dataset path, resolving defaults if not set.
    #[must_use]
    pub fn dataset_path(&self) -> PathBuf {
        self.dataset
            .path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATASET_FILE_NAME))
    }

    /// Get the hunt store path, resolving defaults if not set.
    #[must_use]
    pub fn hunt_database_path(&self) -> PathBuf {
        self.hunt
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(HUNT_FILE_NAME))
    }

    /// Get the dataset re-attempt delay as a Duration.
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.dataset.retry_delay_ms)
    }
}
