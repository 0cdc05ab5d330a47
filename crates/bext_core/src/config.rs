//! Process-level extension configuration.
//!
//! # Responsibility
//! - Hold the knobs the base object consults (data path limit, log level).
//! - Load them from JSON or from `BEXT_*` environment variables.
//!
//! # Invariants
//! - `max_data_path_units` is never zero.
//! - Loading never panics; invalid input is reported as `ConfigError`.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Windows extended-length path limit, in UTF-16 code units.
pub const DEFAULT_MAX_DATA_PATH_UNITS: usize = 32_767;

const ENV_LOG_LEVEL: &str = "BEXT_LOG_LEVEL";
const ENV_MAX_DATA_PATH_UNITS: &str = "BEXT_MAX_DATA_PATH_UNITS";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtensionConfig {
    /// Log level for `init_logging`; `None` uses `default_log_level()`.
    pub log_level: Option<String>,
    /// Largest data path `initialize` will copy. Longer paths fail with an
    /// allocation failure.
    pub max_data_path_units: usize,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            log_level: None,
            max_data_path_units: DEFAULT_MAX_DATA_PATH_UNITS,
        }
    }
}

impl ExtensionConfig {
    /// Parses a JSON document; missing fields take defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Malformed(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads overrides from the process environment on top of defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_LOG_LEVEL) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                config.log_level = Some(trimmed.to_string());
            }
        }

        if let Some(raw) = lookup(ENV_MAX_DATA_PATH_UNITS) {
            let trimmed = raw.trim();
            config.max_data_path_units =
                trimmed
                    .parse::<usize>()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: ENV_MAX_DATA_PATH_UNITS,
                        value: trimmed.to_string(),
                    })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_data_path_units == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_data_path_units",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

/// Configuration load errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Malformed(String),
    InvalidValue { key: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(message) => write!(f, "extension config is malformed: {message}"),
            Self::InvalidValue { key, value } => {
                write!(f, "extension config value is invalid: {key}={value}")
            }
        }
    }
}

impl Error for ConfigError {}
