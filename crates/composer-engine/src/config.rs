//! Session configuration.
//!
//! Every field has a default, so an empty TOML table (or no file at all)
//! yields a working configuration:
//!
//! ```toml
//! [placement]
//! max_attempts = 100
//! seed = 7
//!
//! [export]
//! pretty_json = true
//! ```

use serde::{Deserialize, Serialize};

use composer_bundle::codec::ExportOptions;

use crate::ComposerError;

// ---------------------------------------------------------------------------
// PlacementConfig
// ---------------------------------------------------------------------------

/// Configuration for randomized placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Tries per object before the last attempt is accepted as-is. Must be
    /// at least 1.
    pub max_attempts: u32,
    /// Fixed RNG seed. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            seed: None,
        }
    }
}

// ---------------------------------------------------------------------------
// ExportConfig
// ---------------------------------------------------------------------------

/// Configuration for bundle export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Pretty-print the JSON documents.
    pub pretty_json: bool,
}

impl ExportConfig {
    pub fn options(&self) -> ExportOptions {
        ExportOptions {
            pretty_json: self.pretty_json,
        }
    }
}

// ---------------------------------------------------------------------------
// ComposerConfig
// ---------------------------------------------------------------------------

/// Top-level configuration for a [`ComposerSession`](crate::session::ComposerSession).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposerConfig {
    pub placement: PlacementConfig,
    pub export: ExportConfig,
}

impl ComposerConfig {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ComposerError> {
        if self.placement.max_attempts == 0 {
            return Err(ComposerError::InvalidConfig {
                details: "placement.max_attempts must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_allow_one_hundred_attempts() {
        let config = ComposerConfig::default();
        assert_eq!(config.placement.max_attempts, 100);
        assert_eq!(config.placement.seed, None);
        assert!(!config.export.pretty_json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_documents_fill_in_defaults() {
        let config: ComposerConfig =
            serde_json::from_str(r#"{"placement":{"seed":42}}"#).unwrap();
        assert_eq!(config.placement.seed, Some(42));
        assert_eq!(config.placement.max_attempts, 100);
    }

    #[test]
    fn zero_attempts_is_invalid() {
        let mut config = ComposerConfig::default();
        config.placement.max_attempts = 0;
        assert!(matches!(
            config.validate(),
            Err(ComposerError::InvalidConfig { .. })
        ));
    }
}
