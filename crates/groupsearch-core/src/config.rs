//! `groupsearch` Configuration Module
//!
//! Provides configuration file support via `groupsearch.toml` and
//! environment variables.
//!
//! # Priority (highest to lowest)
//!
//! 1. Environment variables (`GROUPSEARCH_*`, sections separated by `__`)
//! 2. Configuration file (`groupsearch.toml`)
//! 3. Default values

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to parse configuration file.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue {
        /// Configuration key that failed validation.
        key: String,
        /// Validation error message.
        message: String,
    },
}

/// Oversampling and safety bounds of the grouping scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupingConfig {
    /// Multiplier applied to the number of missing hits when sizing a fetch.
    pub oversampling: usize,
    /// Geometric growth of the fetch size between unsatisfied rounds.
    pub growth_factor: usize,
    /// Smallest fetch ever issued.
    pub min_batch: usize,
    /// Largest fetch ever issued.
    pub max_batch: usize,
    /// Maximum number of fetch rounds per request.
    pub max_rounds: usize,
    /// Maximum number of candidates examined per request.
    pub max_candidates: usize,
    /// Request deadline in milliseconds (`None` = no deadline).
    pub timeout_ms: Option<u64>,
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            oversampling: 2,
            growth_factor: 2,
            min_batch: 16,
            max_batch: 10_000,
            max_rounds: 16,
            max_candidates: 100_000,
            timeout_ms: None,
        }
    }
}

impl GroupingConfig {
    /// Returns the request deadline, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Request limits section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum accepted `limit` (number of groups).
    pub max_limit: usize,
    /// Maximum accepted `per_group`.
    pub max_per_group: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_limit: 10_000,
            max_per_group: 1_000,
        }
    }
}

/// Logging configuration section (used by binaries, the library never
/// installs a subscriber).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace.
    pub level: String,
    /// Log format: text or json.
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

/// Main `groupsearch` configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GroupSearchConfig {
    /// Scheduler configuration.
    pub grouping: GroupingConfig,
    /// Request limits.
    pub limits: LimitsConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl GroupSearchConfig {
    /// Loads configuration from default sources.
    ///
    /// Priority: defaults < file < environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("groupsearch.toml")
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file is not an error: defaults and environment still apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration parsing fails.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("GROUPSEARCH_").split("__"));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Creates a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Toml::string(toml_str));

        figment
            .extract()
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let grouping = &self.grouping;

        if grouping.oversampling == 0 {
            return Err(invalid("grouping.oversampling", "must be at least 1"));
        }

        if !(2..=16).contains(&grouping.growth_factor) {
            return Err(invalid(
                "grouping.growth_factor",
                &format!("value {} is out of range [2, 16]", grouping.growth_factor),
            ));
        }

        if grouping.min_batch == 0 {
            return Err(invalid("grouping.min_batch", "must be at least 1"));
        }

        if grouping.max_batch < grouping.min_batch {
            return Err(invalid(
                "grouping.max_batch",
                &format!(
                    "value {} is smaller than grouping.min_batch ({})",
                    grouping.max_batch, grouping.min_batch
                ),
            ));
        }

        if grouping.max_rounds == 0 {
            return Err(invalid("grouping.max_rounds", "must be at least 1"));
        }

        if grouping.max_candidates == 0 {
            return Err(invalid("grouping.max_candidates", "must be at least 1"));
        }

        if grouping.timeout_ms == Some(0) {
            return Err(invalid(
                "grouping.timeout_ms",
                "must be positive (omit it to disable the deadline)",
            ));
        }

        if self.limits.max_limit == 0 {
            return Err(invalid("limits.max_limit", "must be at least 1"));
        }

        if self.limits.max_per_group == 0 {
            return Err(invalid("limits.max_per_group", "must be at least 1"));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(invalid(
                "logging.level",
                &format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.level, valid_levels
                ),
            ));
        }

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(invalid(
                "logging.format",
                &format!(
                    "value '{}' is invalid, expected one of: {:?}",
                    self.logging.format, valid_formats
                ),
            ));
        }

        Ok(())
    }

    /// Serializes the configuration to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

fn invalid(key: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
