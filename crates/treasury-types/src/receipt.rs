//! Operation receipts for the treasury audit trail.
//!
//! Every completed create / deposit / withdraw produces a [`Receipt`]
//! whose `payload_hash` commits to the request ID, the vault, the parties
//! and the resulting balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Identity, RequestId, VaultAddress};

/// The type of action this receipt proves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReceiptType {
    /// A vault was created (and funded to the reserve floor).
    VaultCreated,
    /// Funds were deposited into a vault.
    Deposited,
    /// Funds were withdrawn from a vault to a recipient.
    Withdrawn,
}

impl ReceiptType {
    fn tag(self) -> u8 {
        match self {
            Self::VaultCreated => 0,
            Self::Deposited => 1,
            Self::Withdrawn => 2,
        }
    }
}

impl std::fmt::Display for ReceiptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VaultCreated => write!(f, "VAULT_CREATED"),
            Self::Deposited => write!(f, "DEPOSITED"),
            Self::Withdrawn => write!(f, "WITHDRAWN"),
        }
    }
}

/// Proof that an operation completed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// The request that produced this receipt.
    pub request_id: RequestId,
    /// What kind of action this receipt proves.
    pub receipt_type: ReceiptType,
    /// The vault acted upon.
    pub vault: VaultAddress,
    /// Creator, depositor or withdrawing owner.
    pub actor: Identity,
    /// Withdrawal recipient, if any.
    pub counterparty: Option<Identity>,
    /// Amount moved, in base units. For creation, the opening balance.
    pub amount: u64,
    /// Vault balance after the operation.
    pub balance_after: u64,
    /// SHA-256 over the canonical receipt payload.
    pub payload_hash: [u8; 32],
    /// When this receipt was issued.
    pub issued_at: DateTime<Utc>,
}

impl Receipt {
    /// Build a receipt, computing its payload hash.
    #[must_use]
    pub fn new(
        request_id: RequestId,
        receipt_type: ReceiptType,
        vault: VaultAddress,
        actor: Identity,
        counterparty: Option<Identity>,
        amount: u64,
        balance_after: u64,
    ) -> Self {
        let mut receipt = Self {
            request_id,
            receipt_type,
            vault,
            actor,
            counterparty,
            amount,
            balance_after,
            payload_hash: [0u8; 32],
            issued_at: Utc::now(),
        };
        receipt.payload_hash = receipt.compute_hash();
        receipt
    }

    /// Canonical payload hash.
    ///
    /// Format: `"treasury:receipt:v1:" || request_id || type || vault || actor
    /// || counterparty? || amount || balance_after`
    #[must_use]
    pub fn compute_hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"treasury:receipt:v1:");
        hasher.update(self.request_id.0.as_bytes());
        hasher.update([self.receipt_type.tag()]);
        hasher.update(self.vault.as_bytes());
        hasher.update(self.actor.as_bytes());
        match &self.counterparty {
            Some(c) => {
                hasher.update([1u8]);
                hasher.update(c.as_bytes());
            }
            None => hasher.update([0u8]),
        }
        hasher.update(self.amount.to_le_bytes());
        hasher.update(self.balance_after.to_le_bytes());
        hasher.finalize().into()
    }

    /// Whether the stored hash still matches the receipt contents.
    #[must_use]
    pub fn verify_hash(&self) -> bool {
        self.payload_hash == self.compute_hash()
    }
}
