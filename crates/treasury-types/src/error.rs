//! Error types for the treasury vault ledger.
//!
//! All errors use the `TR_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Request input errors
//! - 2xx: Vault resolution errors
//! - 3xx: Authorization errors
//! - 4xx: Funds errors
//! - 5xx: Arithmetic / derivation errors
//! - 9xx: General / internal errors

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::VaultAddress;

/// The account constraint an unauthorized request failed.
///
/// Labels follow the on-chain constraint names so callers that distinguish
/// "wrong owner" from "forged address" keep working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorityConstraint {
    /// The signer is not the vault's recorded owner.
    HasOne,
    /// The vault address does not re-derive from its own seeds.
    Seeds,
}

impl fmt::Display for AuthorityConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HasOne => write!(f, "ConstraintHasOne"),
            Self::Seeds => write!(f, "ConstraintSeeds"),
        }
    }
}

/// Coarse failure taxonomy handed to UI collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidInput,
    InvalidAmount,
    NotFound,
    AlreadyExists,
    Unauthorized,
    InsufficientFunds,
    ArithmeticOverflow,
    AddressSpaceExhausted,
    Internal,
}

/// Central error enum for all treasury operations.
#[derive(Debug, Error)]
pub enum TreasuryError {
    // =================================================================
    // Input Errors (1xx)
    // =================================================================
    /// The request is malformed (bad name, replayed id, etc.).
    #[error("TR_ERR_100: Invalid input: {reason}")]
    InvalidInput { reason: String },

    /// The amount is zero or otherwise not a positive base-unit quantity.
    #[error("TR_ERR_101: Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    // =================================================================
    // Resolution Errors (2xx)
    // =================================================================
    /// No vault exists at this address.
    #[error("TR_ERR_200: Vault not found: {0}")]
    NotFound(VaultAddress),

    /// A vault already occupies this address.
    #[error("TR_ERR_201: Vault already exists: {0}")]
    AlreadyExists(VaultAddress),

    // =================================================================
    // Authorization Errors (3xx)
    // =================================================================
    /// The request's signer may not perform this operation on the vault.
    #[error("TR_ERR_300: Unauthorized: {constraint} violated on vault {vault}")]
    Unauthorized {
        constraint: AuthorityConstraint,
        vault: VaultAddress,
    },

    // =================================================================
    // Funds Errors (4xx)
    // =================================================================
    /// The withdrawal exceeds the vault's spendable balance.
    #[error("TR_ERR_400: Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: u64, available: u64 },

    // =================================================================
    // Arithmetic / Derivation Errors (5xx)
    // =================================================================
    /// A checked balance operation overflowed or underflowed.
    #[error("TR_ERR_500: Arithmetic overflow: {context}")]
    ArithmeticOverflow { context: String },

    /// No disambiguator produced an acceptable vault address.
    #[error("TR_ERR_501: Address space exhausted for vault name {name:?}")]
    AddressSpaceExhausted { name: String },

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Total balances no longer match recorded inflow. Critical.
    #[error("TR_ERR_900: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },

    /// A stored vault record could not be encoded or decoded.
    #[error("TR_ERR_901: Codec error: {0}")]
    Codec(String),

    /// Configuration error (invalid config file, out-of-range values).
    #[error("TR_ERR_902: Configuration error: {0}")]
    Configuration(String),
}

impl TreasuryError {
    /// Map onto the coarse taxonomy used for UI messaging.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } | Self::Configuration(_) => ErrorKind::InvalidInput,
            Self::InvalidAmount { .. } => ErrorKind::InvalidAmount,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::ArithmeticOverflow { .. } => ErrorKind::ArithmeticOverflow,
            Self::AddressSpaceExhausted { .. } => ErrorKind::AddressSpaceExhausted,
            Self::SupplyInvariantViolation { .. } | Self::Codec(_) => ErrorKind::Internal,
        }
    }

    /// Fatal errors reproduce on retry and indicate a broken assumption.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ArithmeticOverflow { .. }
                | Self::AddressSpaceExhausted { .. }
                | Self::SupplyInvariantViolation { .. }
        )
    }

    /// Shorthand for [`TreasuryError::ArithmeticOverflow`].
    pub fn overflow(context: impl Into<String>) -> Self {
        Self::ArithmeticOverflow {
            context: context.into(),
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, TreasuryError>;

impl From<serde_json::Error> for TreasuryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Configuration(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_display_names_constraint() {
        let err = TreasuryError::Unauthorized {
            constraint: AuthorityConstraint::HasOne,
            vault: VaultAddress::from_bytes([7u8; 32]),
        };
        let msg = format!("{err}");
        assert!(msg.starts_with("TR_ERR_300"), "Got: {msg}");
        assert!(msg.contains("ConstraintHasOne"));
    }

    #[test]
    fn insufficient_funds_display() {
        let err = TreasuryError::InsufficientFunds {
            requested: 1000,
            available: 300,
        };
        let msg = format!("{err}");
        assert!(msg.contains("TR_ERR_400"));
        assert!(msg.contains("1000"));
        assert!(msg.contains("300"));
    }

    #[test]
    fn fatal_kinds() {
        assert!(TreasuryError::overflow("deposit").is_fatal());
        assert!(
            TreasuryError::AddressSpaceExhausted {
                name: "ops".into()
            }
            .is_fatal()
        );
        assert!(
            !TreasuryError::InsufficientFunds {
                requested: 1,
                available: 0
            }
            .is_fatal()
        );
        assert!(
            !TreasuryError::InvalidInput {
                reason: "x".into()
            }
            .is_fatal()
        );
    }

    #[test]
    fn kind_mapping() {
        let addr = VaultAddress::from_bytes([1u8; 32]);
        assert_eq!(TreasuryError::NotFound(addr).kind(), ErrorKind::NotFound);
        assert_eq!(
            TreasuryError::AlreadyExists(addr).kind(),
            ErrorKind::AlreadyExists
        );
        assert_eq!(
            TreasuryError::Unauthorized {
                constraint: AuthorityConstraint::Seeds,
                vault: addr,
            }
            .kind(),
            ErrorKind::Unauthorized
        );
    }

    #[test]
    fn all_errors_have_tr_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(TreasuryError::InvalidAmount {
                reason: "zero".into(),
            }),
            Box::new(TreasuryError::NotFound(VaultAddress::from_bytes([0u8; 32]))),
            Box::new(TreasuryError::Codec("truncated".into())),
            Box::new(TreasuryError::Configuration("bad".into())),
            Box::new(TreasuryError::SupplyInvariantViolation {
                reason: "drift".into(),
            }),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("TR_ERR_"),
                "Error missing TR_ERR_ prefix: {msg}"
            );
        }
    }
}
