//! # treasury-ledger
//!
//! **Vault core**: the state machine behind every treasury vault.
//!
//! ## Architecture
//!
//! 1. **AddressDeriver**: `(owner, name)` → `(address, disambiguator)`
//! 2. **VaultLedger**: keyed store of vaults, one lock per vault
//! 3. **AuthorizationGuard**: seeds and owner constraints before mutation
//! 4. **TransferEngine**: checked deposits / withdrawals, reserve floor
//! 5. **SupplyConservation**: `Σ balances == Σ inflow` audit
//! 6. **codec**: versioned byte layout of a stored vault record
//!
//! ## Withdrawal Flow
//!
//! ```text
//! VaultLedger.get() → AuthorizationGuard.authorize() → TransferEngine.withdraw()
//! ```
//!
//! Funds never leave a vault without passing the guard first.

pub mod codec;
pub mod derive;
pub mod guard;
pub mod ledger;
pub mod supply_conservation;
pub mod transfer;

pub use codec::LayoutVersion;
pub use derive::{AddressDeriver, AddressPredicate, OffCurve};
pub use guard::{AuthorizationGuard, Operation};
pub use ledger::{VaultLedger, VaultRef};
pub use supply_conservation::SupplyConservation;
pub use transfer::TransferEngine;
