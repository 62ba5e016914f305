//! Recovery engine configuration.
//!
//! Loaded from an optional TOML file and overridden by `FAULTLINE__*`
//! environment variables (double underscore separates nested keys, e.g.
//! `FAULTLINE__MAX_RETRIES=5`).

use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable prefix for overrides.
pub const ENV_PREFIX: &str = "FAULTLINE";

/// Errors that can occur when loading recovery configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// The configuration could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] config::ConfigError),

    /// The configuration file path is not valid UTF-8.
    #[error("invalid configuration path: {0}")]
    InvalidPath(String),

    /// A value is outside its allowed range.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Tunables for the recovery orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryConfig {
    /// Upper bound on retries for one logical operation.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Multiplier applied to the delay for each further retry.
    pub backoff_multiplier: f64,
    /// Whether handled errors are reported to the log sink.
    pub log_errors: bool,
    /// Capacity of the in-memory error log buffer.
    pub log_buffer_capacity: usize,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1000,
            backoff_multiplier: 2.0,
            log_errors: true,
            log_buffer_capacity: 256,
        }
    }
}

impl RecoveryConfig {
    /// Load configuration from a TOML file plus environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration file does not exist
    /// - The configuration cannot be parsed
    /// - A value fails [`RecoveryConfig::validate`]
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use faultline::config::RecoveryConfig;
    ///
    /// let config = RecoveryConfig::load("faultline.toml")?;
    /// # Ok::<(), faultline::config::ConfigError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        let path_str = path
            .to_str()
            .ok_or_else(|| ConfigError::InvalidPath(format!("{:?}", path)))?;

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path_str.to_string()));
        }

        Self::build(Some(path_str))
    }

    /// Load defaults plus environment overrides only.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::build(None)
    }

    /// Load from `path` when given, otherwise from the environment only.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::from_env(),
        }
    }

    fn build(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path));
        }
        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let recovery: RecoveryConfig = config.try_deserialize()?;
        recovery.validate()?;
        Ok(recovery)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.backoff_multiplier.is_finite() || self.backoff_multiplier <= 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "backoff_multiplier",
                reason: format!("must be greater than 1.0, got {}", self.backoff_multiplier),
            });
        }
        if self.base_delay_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "base_delay_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.log_buffer_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "log_buffer_capacity",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
