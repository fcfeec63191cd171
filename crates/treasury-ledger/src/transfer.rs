//! Transfer engine: the only code that moves funds.
//!
//! Deposits add to a vault. Withdrawals move funds from a vault to a
//! recipient, which is either another vault or an external identity.
//! Every check (amount, spendable balance, recipient headroom) runs before
//! the first write, so a failed transfer leaves both sides untouched.
//!
//! The reserve floor is never spendable:
//! ```text
//! spendable = balance - reserve_floor   (saturating at 0)
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use treasury_types::{Identity, LedgerConfig, Result, TreasuryError, Vault, VaultAddress};

use crate::ledger::{VaultCell, VaultLedger, apply_delta};

pub struct TransferEngine {
    reserve_floor: u64,
}

impl TransferEngine {
    #[must_use]
    pub fn new(reserve_floor: u64) -> Self {
        Self { reserve_floor }
    }

    #[must_use]
    pub fn from_config(config: &LedgerConfig) -> Self {
        Self::new(config.reserve_floor)
    }

    #[must_use]
    pub fn reserve_floor(&self) -> u64 {
        self.reserve_floor
    }

    /// Add `amount` to the vault at `address`.
    ///
    /// # Errors
    /// - `InvalidAmount` if `amount == 0`
    /// - `NotFound` if there is no vault at `address`
    /// - `ArithmeticOverflow` if the balance would exceed `u64::MAX`
    pub fn deposit(&self, ledger: &VaultLedger, address: &VaultAddress, amount: u64) -> Result<u64> {
        require_positive(amount)?;
        let cell = ledger
            .lookup(address)
            .ok_or(TreasuryError::NotFound(*address))?;
        let mut cell = cell.lock();
        let inflow = cell
            .inflow
            .checked_add(u128::from(amount))
            .ok_or_else(|| TreasuryError::overflow(format!("inflow of {address}")))?;
        let balance = apply_delta(&mut cell.vault, i128::from(amount))?;
        cell.inflow = inflow;
        tracing::debug!(vault = %address, amount, balance, "deposit applied");
        Ok(balance)
    }

    /// Move `amount` from the vault at `address` to `recipient`.
    ///
    /// If `recipient` is itself a vault address the funds land in that
    /// vault; otherwise they are credited to the recipient's external
    /// balance. Returns the source vault's new balance.
    ///
    /// # Errors
    /// - `InvalidAmount` if `amount == 0`
    /// - `NotFound` if there is no vault at `address`
    /// - `InsufficientFunds` if `amount` exceeds the spendable balance
    /// - `ArithmeticOverflow` if the recipient cannot absorb `amount`
    pub fn withdraw(
        &self,
        ledger: &VaultLedger,
        address: &VaultAddress,
        amount: u64,
        recipient: &Identity,
    ) -> Result<u64> {
        require_positive(amount)?;
        let source = ledger
            .lookup(address)
            .ok_or(TreasuryError::NotFound(*address))?;
        let recipient_address = VaultAddress::from_bytes(recipient.0);

        let balance = if recipient_address == *address {
            let cell = source.lock();
            self.check_funds(&cell.vault, amount)?;
            cell.vault.balance
        } else if let Some(dest) = ledger.lookup(&recipient_address) {
            self.withdraw_to_vault(address, &source, &recipient_address, &dest, amount)?
        } else {
            self.withdraw_to_external(ledger, &source, recipient, amount)?
        };
        tracing::debug!(vault = %address, recipient = %recipient, amount, balance, "withdrawal applied");
        Ok(balance)
    }

    fn withdraw_to_external(
        &self,
        ledger: &VaultLedger,
        source: &Arc<Mutex<VaultCell>>,
        recipient: &Identity,
        amount: u64,
    ) -> Result<u64> {
        let mut src = source.lock();
        self.check_funds(&src.vault, amount)?;
        let mut credit = ledger.external.entry(*recipient).or_insert(0);
        let credited = credit
            .checked_add(amount)
            .ok_or_else(|| TreasuryError::overflow(format!("credit to {recipient}")))?;
        let balance = apply_delta(&mut src.vault, -i128::from(amount))?;
        *credit = credited;
        Ok(balance)
    }

    fn withdraw_to_vault(
        &self,
        source_address: &VaultAddress,
        source: &Arc<Mutex<VaultCell>>,
        dest_address: &VaultAddress,
        dest: &Arc<Mutex<VaultCell>>,
        amount: u64,
    ) -> Result<u64> {
        let (mut src, mut dst) = if source_address < dest_address {
            let src = source.lock();
            let dst = dest.lock();
            (src, dst)
        } else {
            let dst = dest.lock();
            let src = source.lock();
            (src, dst)
        };
        self.check_funds(&src.vault, amount)?;
        let credited = dst
            .vault
            .balance
            .checked_add(amount)
            .ok_or_else(|| TreasuryError::overflow(format!("credit to {dest_address}")))?;
        let balance = apply_delta(&mut src.vault, -i128::from(amount))?;
        dst.vault.balance = credited;
        Ok(balance)
    }

    fn check_funds(&self, vault: &Vault, amount: u64) -> Result<()> {
        let available = vault.spendable(self.reserve_floor);
        if amount > available {
            return Err(TreasuryError::InsufficientFunds {
                requested: amount,
                available,
            });
        }
        Ok(())
    }
}

fn require_positive(amount: u64) -> Result<()> {
    if amount == 0 {
        return Err(TreasuryError::InvalidAmount {
            reason: "amount must be greater than zero".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(floor: u64) -> (VaultLedger, TransferEngine, VaultAddress) {
        let ledger = VaultLedger::from_config(&LedgerConfig::default());
        let address = ledger
            .open(&Identity::named("alice"), "ops", floor)
            .unwrap()
            .address();
        (ledger, TransferEngine::new(floor), address)
    }

    #[test]
    fn deposit_increases_balance() {
        let (ledger, engine, addr) = setup(0);
        assert_eq!(engine.deposit(&ledger, &addr, 500).unwrap(), 500);
        assert_eq!(engine.deposit(&ledger, &addr, 1).unwrap(), 501);
    }

    #[test]
    fn zero_amounts_rejected() {
        let (ledger, engine, addr) = setup(0);
        assert!(matches!(
            engine.deposit(&ledger, &addr, 0),
            Err(TreasuryError::InvalidAmount { .. })
        ));
        assert!(matches!(
            engine.withdraw(&ledger, &addr, 0, &Identity::named("bob")),
            Err(TreasuryError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn deposit_overflow_leaves_balance() {
        let (ledger, engine, addr) = setup(0);
        engine.deposit(&ledger, &addr, u64::MAX).unwrap();
        let err = engine.deposit(&ledger, &addr, 1).unwrap_err();
        assert!(matches!(err, TreasuryError::ArithmeticOverflow { .. }));
        assert_eq!(ledger.get(&addr).unwrap().balance, u64::MAX);
    }

    #[test]
    fn deposit_to_missing_vault() {
        let (ledger, engine, _) = setup(0);
        let err = engine
            .deposit(&ledger, &VaultAddress::from_bytes([8u8; 32]), 1)
            .unwrap_err();
        assert!(matches!(err, TreasuryError::NotFound(_)));
    }

    #[test]
    fn withdraw_credits_external_recipient() {
        let (ledger, engine, addr) = setup(0);
        let bob = Identity::named("bob");
        engine.deposit(&ledger, &addr, 500).unwrap();
        assert_eq!(engine.withdraw(&ledger, &addr, 200, &bob).unwrap(), 300);
        assert_eq!(ledger.external_balance(&bob), 200);
        assert!(ledger.verify_supply().is_ok());
    }

    #[test]
    fn reserve_floor_is_not_spendable() {
        let (ledger, engine, addr) = setup(890);
        engine.deposit(&ledger, &addr, 100).unwrap();
        let bob = Identity::named("bob");

        let err = engine.withdraw(&ledger, &addr, 101, &bob).unwrap_err();
        assert!(matches!(
            err,
            TreasuryError::InsufficientFunds {
                requested: 101,
                available: 100
            }
        ));
        assert_eq!(ledger.get(&addr).unwrap().balance, 990);
        assert_eq!(ledger.external_balance(&bob), 0);

        assert_eq!(engine.withdraw(&ledger, &addr, 100, &bob).unwrap(), 890);
    }

    #[test]
    fn withdraw_to_other_vault() {
        let (ledger, engine, addr) = setup(0);
        let other = ledger
            .create(&Identity::named("bob"), "savings")
            .unwrap()
            .address();
        engine.deposit(&ledger, &addr, 500).unwrap();

        engine
            .withdraw(&ledger, &addr, 150, &Identity::from_bytes(other.0))
            .unwrap();
        assert_eq!(ledger.get(&addr).unwrap().balance, 350);
        assert_eq!(ledger.get(&other).unwrap().balance, 150);
        assert!(ledger.verify_supply().is_ok());
    }

    #[test]
    fn withdraw_to_self_is_balance_neutral() {
        let (ledger, engine, addr) = setup(0);
        engine.deposit(&ledger, &addr, 40).unwrap();
        let me = Identity::from_bytes(addr.0);
        assert_eq!(engine.withdraw(&ledger, &addr, 40, &me).unwrap(), 40);
        assert!(engine.withdraw(&ledger, &addr, 41, &me).is_err());
    }

    #[test]
    fn recipient_overflow_leaves_both_sides() {
        let (ledger, engine, addr) = setup(0);
        let whale = ledger
            .create(&Identity::named("whale"), "vault")
            .unwrap()
            .address();
        engine.deposit(&ledger, &whale, u64::MAX).unwrap();
        engine.deposit(&ledger, &addr, 10).unwrap();

        let err = engine
            .withdraw(&ledger, &addr, 10, &Identity::from_bytes(whale.0))
            .unwrap_err();
        assert!(matches!(err, TreasuryError::ArithmeticOverflow { .. }));
        assert_eq!(ledger.get(&addr).unwrap().balance, 10);
        assert_eq!(ledger.get(&whale).unwrap().balance, u64::MAX);
    }

    #[test]
    fn deposit_then_withdraw_restores_balance() {
        let (ledger, engine, addr) = setup(0);
        engine.deposit(&ledger, &addr, 77).unwrap();
        let before = ledger.get(&addr).unwrap().balance;
        engine.deposit(&ledger, &addr, 1_000).unwrap();
        engine
            .withdraw(&ledger, &addr, 1_000, &Identity::named("alice"))
            .unwrap();
        assert_eq!(ledger.get(&addr).unwrap().balance, before);
    }
}
