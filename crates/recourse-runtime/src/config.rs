//! Runtime configuration.
//!
//! Loaded from YAML or JSON. Durations are human-readable (`"1s"`,
//! `"250ms"`).

use recourse_core::Locale;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Build environment, controls developer-channel mirroring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Configuration for the error handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Attempts used by `execute_with_retry` when none are given
    pub max_attempts: u32,

    /// Linear backoff unit: retry N waits `base_delay * N`
    #[serde(with = "duration_human")]
    pub base_delay: Duration,

    /// Error log ring size
    pub log_capacity: usize,

    /// Auto-dismiss delay for notifications
    #[serde(with = "duration_human")]
    pub notification_ttl: Duration,

    /// Suppress identical notifications within this window
    #[serde(with = "duration_human_opt", skip_serializing_if = "Option::is_none")]
    pub dedup_window: Option<Duration>,

    /// Build environment
    pub environment: Environment,

    /// Message catalog
    pub locale: Locale,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            log_capacity: 200,
            notification_ttl: Duration::from_secs(5),
            dedup_window: None,
            environment: Environment::Development,
            locale: Locale::Indonesian,
        }
    }
}

impl RuntimeConfig {
    /// Parse from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file; `.json` is parsed as JSON, anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("max_attempts must be at least 1".to_string()));
        }
        if self.log_capacity == 0 {
            return Err(ConfigError::Invalid("log_capacity must be at least 1".to_string()));
        }
        if self.notification_ttl.is_zero() {
            return Err(ConfigError::Invalid("notification_ttl must be non-zero".to_string()));
        }
        if matches!(self.dedup_window, Some(window) if window.is_zero()) {
            return Err(ConfigError::Invalid(
                "dedup_window must be non-zero when set".to_string(),
            ));
        }
        Ok(())
    }
}

mod duration_human {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

mod duration_human_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_str(&humantime::format_duration(*d).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|text| humantime::parse_duration(&text).map_err(serde::de::Error::custom))
            .transpose()
    }
}
