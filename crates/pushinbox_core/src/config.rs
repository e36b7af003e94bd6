//! Store configuration.
//!
//! # Responsibility
//! - Hold tunables for retention and default texts.
//! - Validate values before a store is opened with them.
//!
//! # Invariants
//! - `max_retained` is at least 1.
//! - Default title/body are never blank.

use crate::model::notification::{NotificationDefaults, DEFAULT_BODY, DEFAULT_TITLE};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Maximum number of records retained by a store with default config.
pub const MAX_RETAINED: usize = 50;

/// Configuration validation/parsing errors.
#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    ZeroRetention,
    BlankDefaultTitle,
    BlankDefaultBody,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid store config: {err}"),
            Self::ZeroRetention => write!(f, "max_retained must be at least 1"),
            Self::BlankDefaultTitle => write!(f, "default_title cannot be blank"),
            Self::BlankDefaultBody => write!(f, "default_body cannot be blank"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}

/// Tunables for one notification store.
///
/// Missing JSON fields take their default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Retention cap; older records beyond it are evicted.
    pub max_retained: usize,
    pub default_title: String,
    pub default_body: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_retained: MAX_RETAINED,
            default_title: DEFAULT_TITLE.to_string(),
            default_body: DEFAULT_BODY.to_string(),
        }
    }
}

impl StoreConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retained == 0 {
            return Err(ConfigError::ZeroRetention);
        }
        if self.default_title.trim().is_empty() {
            return Err(ConfigError::BlankDefaultTitle);
        }
        if self.default_body.trim().is_empty() {
            return Err(ConfigError::BlankDefaultBody);
        }
        Ok(())
    }

    /// Placeholder texts used by normalization.
    pub fn defaults(&self) -> NotificationDefaults {
        NotificationDefaults {
            title: self.default_title.clone(),
            body: self.default_body.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, StoreConfig, MAX_RETAINED};

    #[test]
    fn default_config_is_valid() {
        let config = StoreConfig::default();
        assert_eq!(config.max_retained, MAX_RETAINED);
        config.validate().expect("default config should validate");
    }

    #[test]
    fn from_json_fills_missing_fields() {
        let config = StoreConfig::from_json(r#"{ "max_retained": 5 }"#).expect("valid json");
        assert_eq!(config.max_retained, 5);
        assert_eq!(config.default_title, "New Message");
    }

    #[test]
    fn from_json_rejects_invalid_values() {
        let err = StoreConfig::from_json(r#"{ "max_retained": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroRetention));

        let err = StoreConfig::from_json(r#"{ "default_body": "  " }"#).unwrap_err();
        assert!(matches!(err, ConfigError::BlankDefaultBody));

        let err = StoreConfig::from_json("not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
