//! Authorization guard: the hard gate before any vault mutation.
//!
//! - **Withdraw**: the vault must re-derive from its own seeds
//!   (`ConstraintSeeds`) and the signer must be the recorded owner
//!   (`ConstraintHasOne`). Checked in that order.
//! - **Create**: the proposed vault's owner must be the signer. There is no
//!   delegated creation.
//! - **Deposit**: permissionless.
//!
//! The guard trusts `claimed_signer` as already verified by the transport;
//! it performs no signature cryptography.

use std::sync::Arc;

use treasury_types::{AuthorityConstraint, Identity, Result, TreasuryError, Vault};

use crate::derive::AddressDeriver;
use crate::ledger::VaultLedger;

/// The operation being authorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Deposit,
    Withdraw,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Deposit => write!(f, "deposit"),
            Self::Withdraw => write!(f, "withdraw"),
        }
    }
}

pub struct AuthorizationGuard {
    deriver: Arc<AddressDeriver>,
}

impl AuthorizationGuard {
    #[must_use]
    pub fn new(deriver: Arc<AddressDeriver>) -> Self {
        Self { deriver }
    }

    /// Guard sharing the ledger's address deriver.
    #[must_use]
    pub fn for_ledger(ledger: &VaultLedger) -> Self {
        Self::new(Arc::clone(ledger.deriver()))
    }

    /// Authorize `claimed_signer` to perform `operation` on `vault`.
    ///
    /// # Errors
    /// Returns [`TreasuryError::Unauthorized`] naming the failed constraint.
    pub fn authorize(
        &self,
        vault: &Vault,
        claimed_signer: &Identity,
        operation: Operation,
    ) -> Result<()> {
        match operation {
            Operation::Deposit => Ok(()),
            Operation::Create => Self::require_owner(vault, claimed_signer),
            Operation::Withdraw => {
                if !self.deriver.verify(vault) {
                    return Err(TreasuryError::Unauthorized {
                        constraint: AuthorityConstraint::Seeds,
                        vault: vault.address,
                    });
                }
                Self::require_owner(vault, claimed_signer)
            }
        }
    }

    fn require_owner(vault: &Vault, claimed_signer: &Identity) -> Result<()> {
        if vault.is_owned_by(claimed_signer) {
            Ok(())
        } else {
            Err(TreasuryError::Unauthorized {
                constraint: AuthorityConstraint::HasOne,
                vault: vault.address,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use treasury_types::{LedgerConfig, VaultAddress};

    use super::*;

    fn setup() -> (VaultLedger, AuthorizationGuard, Vault) {
        let ledger = VaultLedger::from_config(&LedgerConfig::default());
        let guard = AuthorizationGuard::for_ledger(&ledger);
        let vault = ledger
            .create(&Identity::named("alice"), "ops")
            .unwrap()
            .snapshot();
        (ledger, guard, vault)
    }

    #[test]
    fn owner_may_withdraw() {
        let (_, guard, vault) = setup();
        assert!(
            guard
                .authorize(&vault, &Identity::named("alice"), Operation::Withdraw)
                .is_ok()
        );
    }

    #[test]
    fn other_identity_cannot_withdraw() {
        let (_, guard, vault) = setup();
        let err = guard
            .authorize(&vault, &Identity::named("carol"), Operation::Withdraw)
            .unwrap_err();
        assert!(matches!(
            err,
            TreasuryError::Unauthorized {
                constraint: AuthorityConstraint::HasOne,
                ..
            }
        ));
    }

    #[test]
    fn one_byte_off_is_unauthorized() {
        let (_, guard, vault) = setup();
        let mut forged = vault.owner;
        forged.0[31] ^= 0x01;
        assert!(guard.authorize(&vault, &forged, Operation::Withdraw).is_err());
    }

    #[test]
    fn forged_address_fails_seeds_even_for_owner() {
        let (_, guard, mut vault) = setup();
        vault.address = VaultAddress::from_bytes([0x99; 32]);
        let err = guard
            .authorize(&vault, &Identity::named("alice"), Operation::Withdraw)
            .unwrap_err();
        assert!(matches!(
            err,
            TreasuryError::Unauthorized {
                constraint: AuthorityConstraint::Seeds,
                ..
            }
        ));
    }

    #[test]
    fn anyone_may_deposit() {
        let (_, guard, vault) = setup();
        assert!(
            guard
                .authorize(&vault, &Identity::random(), Operation::Deposit)
                .is_ok()
        );
    }

    #[test]
    fn create_requires_self_ownership() {
        let (_, guard, vault) = setup();
        assert!(
            guard
                .authorize(&vault, &Identity::named("alice"), Operation::Create)
                .is_ok()
        );
        assert!(
            guard
                .authorize(&vault, &Identity::named("mallory"), Operation::Create)
                .is_err()
        );
    }
}
