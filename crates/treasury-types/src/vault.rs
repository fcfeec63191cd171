//! The vault record: the sole persistent entity of the ledger.

use serde::{Deserialize, Serialize};

use crate::{Identity, VaultAddress};

/// A named, owner-bound account holding a fungible balance.
///
/// Everything except `balance` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    /// Derived from `(owner, name, disambiguator)`.
    pub address: VaultAddress,
    /// Bounded UTF-8 label chosen by the owner.
    pub name: String,
    /// The only identity allowed to withdraw.
    pub owner: Identity,
    /// Recorded derivation disambiguator, re-checked on withdraw.
    pub disambiguator: u8,
    /// Balance in base units.
    pub balance: u64,
}

impl Vault {
    /// Amount withdrawable above the reserve floor.
    #[must_use]
    pub fn spendable(&self, reserve_floor: u64) -> u64 {
        self.balance.saturating_sub(reserve_floor)
    }

    /// Whether `identity` is the recorded owner (byte-for-byte).
    #[must_use]
    pub fn is_owned_by(&self, identity: &Identity) -> bool {
        self.owner == *identity
    }
}
