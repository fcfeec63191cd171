//! Request lifecycle phases.
//!
//! Every request walks the same gates:
//! **RECEIVED → RESOLVED → AUTHORIZED → APPLIED → COMPLETED**
//!
//! A failure at any gate ends the request with a [`Rejection`] naming that
//! gate; there is no separate rejected phase. Nothing is written
//! to the ledger before APPLIED, and APPLIED either commits fully or not at
//! all, so a rejection never leaves partial state behind.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use treasury_types::{ErrorKind, TreasuryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestPhase {
    /// Shape and bounds checks; replay check.
    Received,
    /// Target vault looked up (or its address derived).
    Resolved,
    /// Signer checked against the vault.
    Authorized,
    /// Ledger mutation committed.
    Applied,
    /// Result handed back.
    Completed,
}

impl fmt::Display for RequestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Received => write!(f, "RECEIVED"),
            Self::Resolved => write!(f, "RESOLVED"),
            Self::Authorized => write!(f, "AUTHORIZED"),
            Self::Applied => write!(f, "APPLIED"),
            Self::Completed => write!(f, "COMPLETED"),
        }
    }
}

impl RequestPhase {
    /// The next gate. `Completed` stays put.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Received => Self::Resolved,
            Self::Resolved => Self::Authorized,
            Self::Authorized => Self::Applied,
            Self::Applied | Self::Completed => Self::Completed,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// A request that stopped at a gate.
///
/// `phase` is the gate the request stopped at; `error` is returned
/// verbatim so the caller can drive UI messaging from it.
#[derive(Debug, Error)]
#[error("rejected while {phase}: {error}")]
pub struct Rejection {
    pub phase: RequestPhase,
    #[source]
    pub error: TreasuryError,
}

impl Rejection {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_advance_in_order() {
        let mut phase = RequestPhase::Received;
        let mut seen = vec![phase];
        while !phase.is_terminal() {
            phase = phase.next();
            seen.push(phase);
        }
        assert_eq!(
            seen,
            vec![
                RequestPhase::Received,
                RequestPhase::Resolved,
                RequestPhase::Authorized,
                RequestPhase::Applied,
                RequestPhase::Completed,
            ]
        );
    }

    #[test]
    fn only_completed_is_terminal() {
        assert!(RequestPhase::Completed.is_terminal());
        assert_eq!(RequestPhase::Completed.next(), RequestPhase::Completed);
        for gate in [
            RequestPhase::Received,
            RequestPhase::Resolved,
            RequestPhase::Authorized,
            RequestPhase::Applied,
        ] {
            assert!(!gate.is_terminal());
        }
    }

    #[test]
    fn rejection_display_and_kind() {
        let rejection = Rejection {
            phase: RequestPhase::Applied,
            error: TreasuryError::InsufficientFunds {
                requested: 1000,
                available: 300,
            },
        };
        let msg = format!("{rejection}");
        assert!(msg.contains("APPLIED"));
        assert!(msg.contains("TR_ERR_400"));
        assert_eq!(rejection.kind(), ErrorKind::InsufficientFunds);
    }
}
