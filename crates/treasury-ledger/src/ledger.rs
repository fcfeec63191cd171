//! The vault ledger: the keyed store of every vault account.
//!
//! Each vault lives behind its own [`Mutex`], so operations on one vault are
//! strictly serialized while operations on different vaults run in
//! parallel. The outer [`DashMap`] is only held long enough to clone the
//! vault's handle; no vault lock is ever taken while a map shard is held.
//!
//! Lock order, when more than one is needed:
//! 1. vault cells, in ascending address order
//! 2. the external-credit shard of the recipient

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use treasury_types::{Identity, LedgerConfig, Result, TreasuryError, Vault, VaultAddress};

use crate::codec::{self, LayoutVersion};
use crate::derive::AddressDeriver;
use crate::supply_conservation::SupplyConservation;

/// A vault together with the funds that entered the ledger through it.
pub(crate) struct VaultCell {
    pub(crate) vault: Vault,
    pub(crate) inflow: u128,
}

/// Handle to a vault stored in a [`VaultLedger`].
#[derive(Clone)]
pub struct VaultRef {
    address: VaultAddress,
    cell: Arc<Mutex<VaultCell>>,
}

impl VaultRef {
    #[must_use]
    pub fn address(&self) -> VaultAddress {
        self.address
    }

    /// Consistent copy of the vault at this instant.
    #[must_use]
    pub fn snapshot(&self) -> Vault {
        self.cell.lock().vault.clone()
    }

    #[must_use]
    pub fn balance(&self) -> u64 {
        self.cell.lock().vault.balance
    }
}

impl std::fmt::Debug for VaultRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultRef")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// In-memory store of all vaults plus credits owed to non-vault recipients.
///
/// Ledgers are plain values: construct as many as needed, pass them
/// explicitly.
pub struct VaultLedger {
    deriver: Arc<AddressDeriver>,
    vaults: DashMap<VaultAddress, Arc<Mutex<VaultCell>>>,
    pub(crate) external: DashMap<Identity, u64>,
}

impl VaultLedger {
    /// Create an empty ledger using `deriver` for vault addresses.
    #[must_use]
    pub fn new(deriver: AddressDeriver) -> Self {
        Self {
            deriver: Arc::new(deriver),
            vaults: DashMap::new(),
            external: DashMap::new(),
        }
    }

    /// Create an empty ledger with the default off-curve deriver.
    #[must_use]
    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(AddressDeriver::new(config))
    }

    #[must_use]
    pub fn deriver(&self) -> &Arc<AddressDeriver> {
        &self.deriver
    }

    /// Create a vault for `(owner, name)` with a zero balance.
    ///
    /// # Errors
    /// - `AlreadyExists` if the derived address is occupied
    /// - `AddressSpaceExhausted` / `InvalidInput` from derivation
    pub fn create(&self, owner: &Identity, name: &str) -> Result<VaultRef> {
        self.open(owner, name, 0)
    }

    /// Create a vault already holding `opening_balance`.
    ///
    /// Creation and funding are one step: the vault is never visible with a
    /// balance other than `opening_balance`.
    pub fn open(&self, owner: &Identity, name: &str, opening_balance: u64) -> Result<VaultRef> {
        let (address, disambiguator) = self.deriver.derive(owner, name)?;
        let vault = Vault {
            address,
            name: name.to_string(),
            owner: *owner,
            disambiguator,
            balance: opening_balance,
        };
        let cell = self.insert_new(vault, u128::from(opening_balance))?;
        tracing::debug!(
            vault = %address,
            owner = %owner,
            disambiguator,
            opening_balance,
            "vault created"
        );
        Ok(VaultRef { address, cell })
    }

    /// Snapshot of the vault at `address`.
    ///
    /// # Errors
    /// Returns `NotFound` if no vault exists there.
    pub fn get(&self, address: &VaultAddress) -> Result<Vault> {
        Ok(self.vault_ref(address)?.snapshot())
    }

    /// Handle to the vault at `address`.
    pub fn vault_ref(&self, address: &VaultAddress) -> Result<VaultRef> {
        let cell = self.lookup(address).ok_or(TreasuryError::NotFound(*address))?;
        Ok(VaultRef {
            address: *address,
            cell,
        })
    }

    /// Resolve a vault by its seeds instead of its address.
    pub fn find(&self, owner: &Identity, name: &str) -> Result<VaultRef> {
        let (address, _) = self.deriver.derive(owner, name)?;
        self.vault_ref(&address)
    }

    #[must_use]
    pub fn contains(&self, address: &VaultAddress) -> bool {
        self.vaults.contains_key(address)
    }

    /// Funds credited to a non-vault identity by withdrawals.
    #[must_use]
    pub fn external_balance(&self, identity: &Identity) -> u64 {
        self.external.get(identity).map_or(0, |credit| *credit)
    }

    /// Number of vaults.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vaults.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vaults.is_empty()
    }

    /// Gather supply totals. Only meaningful while no operation is in
    /// flight; concurrent transfers may be observed half-way across vaults.
    #[must_use]
    pub fn supply(&self) -> SupplyConservation {
        let cells: Vec<_> = self
            .vaults
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        let mut report = SupplyConservation::default();
        for cell in cells {
            let cell = cell.lock();
            report.inflow += cell.inflow;
            report.vault_balances += u128::from(cell.vault.balance);
        }
        report.external_credits = self
            .external
            .iter()
            .map(|credit| u128::from(*credit.value()))
            .sum();
        report
    }

    /// Verify supply conservation across the whole ledger.
    pub fn verify_supply(&self) -> Result<()> {
        self.supply().verify()
    }

    /// Encode the vault at `address` in the given record layout.
    pub fn export_record(&self, address: &VaultAddress, version: LayoutVersion) -> Result<Vec<u8>> {
        codec::encode(&self.get(address)?, version)
    }

    /// Load a vault from a V2 record stored at `address`.
    ///
    /// V1 records carry no balance and are refused. The record's seeds must
    /// re-derive to `address`, so a record cannot be replanted under a
    /// different vault's address.
    pub fn restore(&self, address: VaultAddress, bytes: &[u8]) -> Result<VaultRef> {
        let record = codec::decode(bytes, LayoutVersion::V2)?;
        let balance = record
            .balance
            .ok_or_else(|| TreasuryError::Codec("V2 record without balance".to_string()))?;
        let vault = record.into_vault(address, balance);
        if !self.deriver.verify(&vault) {
            return Err(TreasuryError::Codec(format!(
                "record seeds do not derive {address}"
            )));
        }
        let cell = self.insert_new(vault, u128::from(balance))?;
        tracing::debug!(vault = %address, balance, "vault restored");
        Ok(VaultRef { address, cell })
    }

    pub(crate) fn lookup(&self, address: &VaultAddress) -> Option<Arc<Mutex<VaultCell>>> {
        self.vaults.get(address).map(|entry| Arc::clone(entry.value()))
    }

    fn insert_new(&self, vault: Vault, inflow: u128) -> Result<Arc<Mutex<VaultCell>>> {
        match self.vaults.entry(vault.address) {
            Entry::Occupied(_) => Err(TreasuryError::AlreadyExists(vault.address)),
            Entry::Vacant(slot) => {
                let cell = Arc::new(Mutex::new(VaultCell { vault, inflow }));
                slot.insert(Arc::clone(&cell));
                Ok(cell)
            }
        }
    }
}

impl std::fmt::Debug for VaultLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultLedger")
            .field("vaults", &self.vaults.len())
            .field("external", &self.external.len())
            .finish_non_exhaustive()
    }
}

/// Apply a signed delta to a vault balance with checked arithmetic.
///
/// Either the whole delta is applied or the vault is left untouched.
pub(crate) fn apply_delta(vault: &mut Vault, delta: i128) -> Result<u64> {
    let next = i128::from(vault.balance)
        .checked_add(delta)
        .ok_or_else(|| TreasuryError::overflow(format!("delta {delta} on {}", vault.address)))?;
    let next = u64::try_from(next).map_err(|_| {
        TreasuryError::overflow(format!(
            "balance of {} would become {next}",
            vault.address
        ))
    })?;
    vault.balance = next;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> VaultLedger {
        VaultLedger::from_config(&LedgerConfig::default())
    }

    #[test]
    fn create_starts_at_zero() {
        let ledger = ledger();
        let owner = Identity::named("alice");
        let vault = ledger.create(&owner, "ops").unwrap();
        let snap = vault.snapshot();
        assert_eq!(snap.balance, 0);
        assert_eq!(snap.owner, owner);
        assert_eq!(snap.name, "ops");
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn duplicate_create_rejected_and_state_kept() {
        let ledger = ledger();
        let owner = Identity::named("alice");
        let first = ledger.open(&owner, "ops", 890).unwrap();
        let before = first.snapshot();

        let err = ledger.create(&owner, "ops").unwrap_err();
        assert!(matches!(err, TreasuryError::AlreadyExists(a) if a == first.address()));
        assert_eq!(ledger.get(&first.address()).unwrap(), before);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn same_name_different_owner_is_distinct() {
        let ledger = ledger();
        let a = ledger.create(&Identity::named("alice"), "ops").unwrap();
        let b = ledger.create(&Identity::named("bob"), "ops").unwrap();
        assert_ne!(a.address(), b.address());
    }

    #[test]
    fn get_missing_is_not_found() {
        let err = ledger().get(&VaultAddress::from_bytes([5u8; 32])).unwrap_err();
        assert!(matches!(err, TreasuryError::NotFound(_)));
    }

    #[test]
    fn find_by_seeds() {
        let ledger = ledger();
        let owner = Identity::named("alice");
        let created = ledger.create(&owner, "ops").unwrap();
        assert_eq!(ledger.find(&owner, "ops").unwrap().address(), created.address());
        assert!(ledger.find(&owner, "payroll").is_err());
    }

    #[test]
    fn apply_delta_is_checked() {
        let ledger = ledger();
        let mut vault = ledger.create(&Identity::named("alice"), "ops").unwrap().snapshot();

        assert_eq!(apply_delta(&mut vault, 100).unwrap(), 100);
        let err = apply_delta(&mut vault, -101).unwrap_err();
        assert!(matches!(err, TreasuryError::ArithmeticOverflow { .. }));
        assert_eq!(vault.balance, 100);

        vault.balance = u64::MAX;
        assert!(apply_delta(&mut vault, 1).is_err());
        assert_eq!(vault.balance, u64::MAX);
    }

    #[test]
    fn opening_balance_counts_as_inflow() {
        let ledger = ledger();
        ledger.open(&Identity::named("alice"), "ops", 890).unwrap();
        let supply = ledger.supply();
        assert_eq!(supply.inflow, 890);
        assert_eq!(supply.vault_balances, 890);
        assert!(ledger.verify_supply().is_ok());
    }

    #[test]
    fn export_restore_into_fresh_ledger() {
        let source = ledger();
        let vault = source.open(&Identity::named("alice"), "ops", 1_234).unwrap();
        let bytes = source
            .export_record(&vault.address(), LayoutVersion::V2)
            .unwrap();

        let target = ledger();
        let restored = target.restore(vault.address(), &bytes).unwrap();
        assert_eq!(restored.snapshot(), vault.snapshot());
        assert!(target.verify_supply().is_ok());
    }

    #[test]
    fn restore_refuses_v1_record() {
        let source = ledger();
        let vault = source.open(&Identity::named("alice"), "ops", 1_234).unwrap();
        let mut bytes = source
            .export_record(&vault.address(), LayoutVersion::V1)
            .unwrap();
        bytes.resize(codec::space(LayoutVersion::V1), 0);

        let target = ledger();
        let err = target.restore(vault.address(), &bytes).unwrap_err();
        assert!(matches!(err, TreasuryError::Codec(_)));
        assert!(target.is_empty());
    }

    #[test]
    fn restore_under_foreign_address_rejected() {
        let source = ledger();
        let vault = source.open(&Identity::named("alice"), "ops", 10).unwrap();
        let bytes = source
            .export_record(&vault.address(), LayoutVersion::V2)
            .unwrap();

        let err = ledger()
            .restore(VaultAddress::from_bytes([0x42; 32]), &bytes)
            .unwrap_err();
        assert!(matches!(err, TreasuryError::Codec(_)));
    }

    #[test]
    fn independent_ledgers_do_not_share_state() {
        let a = ledger();
        let b = ledger();
        let owner = Identity::named("alice");
        a.create(&owner, "ops").unwrap();
        assert!(b.create(&owner, "ops").is_ok());
    }
}
