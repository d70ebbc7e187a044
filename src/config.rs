//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration. Command line flags override file values.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::archive;
use crate::error::{HumidityError, Result};
use crate::serial::{is_valid_baud_rate, DEFAULT_BAUD_RATE, DEFAULT_MANUFACTURER};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    /// Device path; auto-detected when absent
    #[serde(default)]
    pub port: Option<String>,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// USB manufacturer string used for auto-detection
    #[serde(default = "default_manufacturer")]
    pub manufacturer: String,
}

/// Archive output configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ArchiveConfig {
    /// Archive root; `<home>/.garden/metrics/pots/humidity` when absent
    #[serde(default)]
    pub root_dir: Option<PathBuf>,
}

/// Log file configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Directory for a daily rolling log file; stderr only when absent
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: default_baud_rate(),
            manufacturer: default_manufacturer(),
        }
    }
}

// Default value functions
fn default_baud_rate() -> u32 { DEFAULT_BAUD_RATE }
fn default_manufacturer() -> String { DEFAULT_MANUFACTURER.to_string() }

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use garden_humidity::config::Config;
    ///
    /// let config = Config::load("config/garden-humidity.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Archive root, falling back to the per-user default
    pub fn archive_root(&self) -> Result<PathBuf> {
        match &self.archive.root_dir {
            Some(dir) => Ok(dir.clone()),
            None => archive::default_root(),
        }
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if let Some(port) = &self.serial.port {
            if port.is_empty() {
                return Err(invalid("serial port cannot be empty"));
            }
        }

        if !is_valid_baud_rate(self.serial.baud_rate) {
            return Err(invalid(format!(
                "baud_rate {} is not a supported rate",
                self.serial.baud_rate
            )));
        }

        if self.serial.manufacturer.is_empty() {
            return Err(invalid("serial manufacturer cannot be empty"));
        }

        if matches!(&self.archive.root_dir, Some(dir) if dir.as_os_str().is_empty()) {
            return Err(invalid("archive root_dir cannot be empty"));
        }

        if matches!(&self.logging.dir, Some(dir) if dir.as_os_str().is_empty()) {
            return Err(invalid("logging dir cannot be empty"));
        }

        Ok(())
    }
}

fn invalid(msg: impl std::fmt::Display) -> HumidityError {
    HumidityError::Config(toml::de::Error::custom(msg))
}
