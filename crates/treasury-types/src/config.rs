//! Configuration supplied by the hosting environment.

use serde::{Deserialize, Serialize};

use crate::{Result, TreasuryError, constants};

/// Ledger configuration.
///
/// The reserve floor is computed by the host (for example from a rent
/// schedule) and handed in as a constant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Minimum balance a vault must hold to exist. Never spendable.
    pub reserve_floor: u64,
    /// Maximum vault name length in bytes.
    pub max_name_len: usize,
    /// Domain tag mixed into every derived address.
    pub domain_tag: String,
    /// Program identity namespacing derived addresses.
    pub program_id: [u8; 32],
    /// Number of processed request IDs remembered for replay rejection.
    pub replay_cache_size: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            reserve_floor: constants::DEFAULT_RESERVE_FLOOR,
            max_name_len: constants::DEFAULT_MAX_NAME_LEN,
            domain_tag: constants::DEFAULT_DOMAIN_TAG.to_string(),
            program_id: constants::DEFAULT_PROGRAM_ID,
            replay_cache_size: constants::DEFAULT_REPLAY_CACHE_SIZE,
        }
    }
}

impl LedgerConfig {
    /// Default configuration with the given reserve floor.
    #[must_use]
    pub fn with_reserve_floor(reserve_floor: u64) -> Self {
        Self {
            reserve_floor,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check that every value is within the bounds derivation requires.
    pub fn validate(&self) -> Result<()> {
        if self.max_name_len == 0 || self.max_name_len > constants::MAX_SEED_LEN {
            return Err(TreasuryError::Configuration(format!(
                "max_name_len must be in 1..={}, got {}",
                constants::MAX_SEED_LEN,
                self.max_name_len
            )));
        }
        if self.domain_tag.is_empty() || self.domain_tag.len() > constants::MAX_SEED_LEN {
            return Err(TreasuryError::Configuration(format!(
                "domain_tag must be 1..={} bytes",
                constants::MAX_SEED_LEN
            )));
        }
        if self.replay_cache_size == 0 {
            return Err(TreasuryError::Configuration(
                "replay_cache_size must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = LedgerConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.reserve_floor, 0);
        assert_eq!(cfg.max_name_len, 32);
        assert_eq!(cfg.domain_tag, "treasury");
    }

    #[test]
    fn from_json_fills_missing_fields() {
        let cfg = LedgerConfig::from_json(r#"{"reserve_floor": 890880}"#).unwrap();
        assert_eq!(cfg.reserve_floor, 890_880);
        assert_eq!(cfg.max_name_len, constants::DEFAULT_MAX_NAME_LEN);
    }

    #[test]
    fn oversize_name_limit_rejected() {
        let err = LedgerConfig::from_json(r#"{"max_name_len": 50}"#).unwrap_err();
        assert!(matches!(err, TreasuryError::Configuration(_)));
    }

    #[test]
    fn empty_domain_tag_rejected() {
        let cfg = LedgerConfig {
            domain_tag: String::new(),
            ..LedgerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn malformed_json_is_configuration_error() {
        let err = LedgerConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, TreasuryError::Configuration(_)));
    }
}
