//! # treasury-dispatch
//!
//! **Request boundary**: turns signed create / deposit / withdraw requests
//! into ledger operations.
//!
//! ## Request Flow
//!
//! ```text
//! Request ──▶ ReplayGuard.claim()
//!         ──▶ RECEIVED    (name bounds, non-zero amount)
//!         ──▶ RESOLVED    (VaultLedger lookup / AddressDeriver)
//!         ──▶ AUTHORIZED  (AuthorizationGuard)
//!         ──▶ APPLIED     (TransferEngine / VaultLedger.open)
//!         ──▶ COMPLETED   (Receipt issued)
//! ```
//!
//! A request that fails any gate returns a [`Rejection`] carrying the gate
//! and the [`TreasuryError`](treasury_types::TreasuryError), and the
//! ledger is left exactly as it was.

pub mod dispatcher;
pub mod phase;
pub mod replay;
pub mod request;

pub use dispatcher::{Completion, Outcome, RequestDispatcher};
pub use phase::{Rejection, RequestPhase};
pub use replay::ReplayGuard;
pub use request::{Command, Request, VaultTarget};
