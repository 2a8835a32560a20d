//! # ECS Configuration
//!
//! Loaded once at startup. Every field has a default, so an empty TOML
//! table is a valid configuration.
//!
//! ```toml
//! max_entities = 10000
//! reserve_entities = 256
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ecs::MAX_NUM_ENTITIES;
use crate::error::ConfigError;

/// Capacity settings for an [`EcsManager`](crate::EcsManager).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EcsConfig {
    /// Hard ceiling on simultaneously live entity slots.
    pub max_entities: usize,
    /// Entity slots to pre-allocate.
    pub reserve_entities: usize,
}

impl Default for EcsConfig {
    fn default() -> Self {
        Self {
            max_entities: MAX_NUM_ENTITIES,
            reserve_entities: 0,
        }
    }
}

impl EcsConfig {
    /// Config with the given entity ceiling and no reservation.
    #[must_use]
    pub fn with_max_entities(max_entities: usize) -> Self {
        Self {
            max_entities,
            ..Self::default()
        }
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML and
    /// [`ConfigError::Invalid`] on out-of-range values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `max_entities` is zero or does
    /// not fit in a `u32`, or if `reserve_entities` exceeds `max_entities`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_entities == 0 {
            return Err(ConfigError::Invalid(
                "max_entities must be greater than zero".into(),
            ));
        }
        if u32::try_from(self.max_entities).is_err() {
            return Err(ConfigError::Invalid(format!(
                "max_entities {} exceeds u32::MAX",
                self.max_entities
            )));
        }
        if self.reserve_entities > self.max_entities {
            return Err(ConfigError::Invalid(format!(
                "reserve_entities {} exceeds max_entities {}",
                self.reserve_entities, self.max_entities
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EcsConfig::default();
        assert_eq!(config.max_entities, 10_000);
        assert_eq!(config.reserve_entities, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        assert_eq!(EcsConfig::from_toml_str("").unwrap(), EcsConfig::default());
    }

    #[test]
    fn test_parse_values() {
        let config = EcsConfig::from_toml_str("max_entities = 64\nreserve_entities = 8\n").unwrap();
        assert_eq!(config.max_entities, 64);
        assert_eq!(config.reserve_entities, 8);
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let err = EcsConfig::from_toml_str("max_entities = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_oversized_reserve() {
        let err = EcsConfig::from_toml_str("max_entities = 4\nreserve_entities = 5").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let err = EcsConfig::from_toml_str("max_entitys = 4").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = EcsConfig::load("/nonexistent/glint.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
