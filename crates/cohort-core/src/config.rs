//! Engine configuration
//!
//! Loaded from TOML or built in code; every field has a default.

use cohort_ingest::DEFAULT_ENVELOPE_KEY;
use serde::{Deserialize, Serialize};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML could not be parsed
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Session-wide engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Desired members per group
    pub group_size: usize,
    /// Envelope key the proposal source nests payloads under
    pub envelope_key: String,
    /// Relay committed divisions to the secondary consumer
    pub secondary_delivery: bool,
    /// Offer a random division when automated grouping fails
    pub fallback_to_random: bool,
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With group size
    #[inline]
    #[must_use]
    pub fn with_group_size(mut self, group_size: usize) -> Self {
        self.group_size = group_size;
        self
    }

    /// With envelope key
    #[inline]
    #[must_use]
    pub fn with_envelope_key(mut self, key: impl Into<String>) -> Self {
        self.envelope_key = key.into();
        self
    }

    /// With secondary delivery on or off
    #[inline]
    #[must_use]
    pub fn with_secondary_delivery(mut self, enabled: bool) -> Self {
        self.secondary_delivery = enabled;
        self
    }

    /// With random fallback on or off
    #[inline]
    #[must_use]
    pub fn with_fallback_to_random(mut self, enabled: bool) -> Self {
        self.fallback_to_random = enabled;
        self
    }

    /// Parse and validate TOML
    ///
    /// # Errors
    /// - `ConfigError::Parse` for malformed TOML
    /// - `ConfigError::Invalid` for out-of-range values
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// - `ConfigError::Invalid` for a zero group size or an empty envelope key
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.group_size == 0 {
            return Err(ConfigError::Invalid("group_size must be at least 1".into()));
        }
        if self.envelope_key.trim().is_empty() {
            return Err(ConfigError::Invalid("envelope_key must not be empty".into()));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            group_size: 4,
            envelope_key: DEFAULT_ENVELOPE_KEY.to_string(),
            secondary_delivery: true,
            fallback_to_random: true,
        }
    }
}
