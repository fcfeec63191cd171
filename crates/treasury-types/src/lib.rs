//! # treasury-types
//!
//! Shared types, errors, and configuration for the **treasury** vault ledger.
//!
//! This crate is the leaf dependency of the workspace. It defines:
//!
//! - **Identifiers**: [`Identity`], [`VaultAddress`], [`RequestId`]
//! - **Vault model**: [`Vault`]
//! - **Receipts**: [`Receipt`], [`ReceiptType`]
//! - **Configuration**: [`LedgerConfig`]
//! - **Errors**: [`TreasuryError`] with `TR_ERR_` prefix codes, [`ErrorKind`]
//! - **Units**: display-coin / base-unit conversion in [`units`]
//! - **Constants**: system-wide limits and defaults

pub mod config;
pub mod constants;
pub mod error;
pub mod ids;
pub mod receipt;
pub mod units;
pub mod vault;

pub use config::*;
pub use error::*;
pub use ids::*;
pub use receipt::*;
pub use vault::*;

// Constants and unit conversions are accessed via their modules
// (`treasury_types::constants::FOO`, `treasury_types::units::to_base_units`).
