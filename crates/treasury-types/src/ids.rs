//! Identifiers used throughout the treasury ledger.
//!
//! Identities and vault addresses are raw 32-byte keys in the same address
//! space: an owner is an ed25519 public key, a vault address is a derived
//! key that deliberately has no private counterpart. Request IDs use
//! UUIDv7 for time-ordered sorting.

use std::fmt;

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A verified signer / owner / recipient identity.
/// This is the raw ed25519 public key (32 bytes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Identity(pub [u8; 32]);

impl Identity {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<VerifyingKey> for Identity {
    fn from(key: VerifyingKey) -> Self {
        Self(key.to_bytes())
    }
}

impl From<VaultAddress> for Identity {
    /// A vault may itself be named as a withdrawal recipient.
    fn from(address: VaultAddress) -> Self {
        Self(address.0)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "id:{}", hex::encode(&self.0[..8]))
    }
}

/// Test helpers.
#[cfg(any(test, feature = "test-helpers"))]
impl Identity {
    /// A fresh identity backed by a real ed25519 keypair.
    pub fn random() -> Self {
        let signing = ed25519_dalek::SigningKey::generate(&mut rand::rngs::OsRng);
        Self::from(signing.verifying_key())
    }

    /// A stable identity for a human-readable fixture label ("alice", "bob").
    pub fn named(label: &str) -> Self {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(b"treasury:test-identity:");
        hasher.update(label.as_bytes());
        Self(hasher.finalize().into())
    }
}

// ---------------------------------------------------------------------------
// VaultAddress
// ---------------------------------------------------------------------------

/// Deterministically derived address of a vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct VaultAddress(pub [u8; 32]);

impl VaultAddress {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for VaultAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vault:{}", hex::encode(self.0))
    }
}

// ---------------------------------------------------------------------------
// RequestId
// ---------------------------------------------------------------------------

/// Unique identifier for a submitted request. Used for replay rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
