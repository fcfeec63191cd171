//! Supply conservation invariant checker.
//!
//! Funds only enter the ledger through deposits and opening balances, and
//! a withdrawal moves them to a recipient without destroying them:
//! ```text
//! Σ(vault balances) + Σ(external credits) == Σ(inflow)
//! ```
//!
//! If this ever breaks, something has gone catastrophically wrong.

use treasury_types::{Result, TreasuryError};

/// Point-in-time totals gathered from a ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupplyConservation {
    /// Total funds that entered the ledger.
    pub inflow: u128,
    /// Sum of all vault balances.
    pub vault_balances: u128,
    /// Sum of all external (non-vault) recipient credits.
    pub external_credits: u128,
}

impl SupplyConservation {
    /// Funds currently held anywhere in the ledger.
    #[must_use]
    pub fn actual_supply(&self) -> u128 {
        self.vault_balances + self.external_credits
    }

    /// Verify that held funds equal recorded inflow.
    ///
    /// # Errors
    /// Returns [`TreasuryError::SupplyInvariantViolation`] if they differ.
    pub fn verify(&self) -> Result<()> {
        let actual = self.actual_supply();
        if actual != self.inflow {
            tracing::error!(
                actual,
                expected = self.inflow,
                "supply invariant violated"
            );
            return Err(TreasuryError::SupplyInvariantViolation {
                reason: format!(
                    "actual supply {actual} != expected {} (vaults={}, external={})",
                    self.inflow, self.vault_balances, self.external_credits
                ),
            });
        }
        Ok(())
    }
}
