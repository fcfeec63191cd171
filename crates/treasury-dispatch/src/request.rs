//! Typed requests accepted at the dispatcher boundary.
//!
//! Identities carried here are already verified by the transport layer:
//! `owner` on create, `depositor` on deposit and `signer` on withdraw are
//! the request's signer.

use serde::{Deserialize, Serialize};
use treasury_ledger::Operation;
use treasury_types::{Identity, RequestId, VaultAddress};

/// How a deposit names its vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultTarget {
    /// The vault's derived address.
    Address(VaultAddress),
    /// The vault's seeds; the address is derived.
    Seeds { owner: Identity, name: String },
}

impl From<VaultAddress> for VaultTarget {
    fn from(address: VaultAddress) -> Self {
        Self::Address(address)
    }
}

/// The operation a request asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    /// Create a vault owned by the signer.
    Create { owner: Identity, name: String },
    /// Add funds to any existing vault.
    Deposit {
        target: VaultTarget,
        amount: u64,
        depositor: Identity,
    },
    /// Move funds out of a vault; only its owner may sign.
    Withdraw {
        vault: VaultAddress,
        amount: u64,
        recipient: Identity,
        signer: Identity,
    },
}

impl Command {
    #[must_use]
    pub fn operation(&self) -> Operation {
        match self {
            Self::Create { .. } => Operation::Create,
            Self::Deposit { .. } => Operation::Deposit,
            Self::Withdraw { .. } => Operation::Withdraw,
        }
    }

    /// The verified identity that signed this command.
    #[must_use]
    pub fn signer(&self) -> &Identity {
        match self {
            Self::Create { owner, .. } => owner,
            Self::Deposit { depositor, .. } => depositor,
            Self::Withdraw { signer, .. } => signer,
        }
    }
}

/// A command plus the unique ID used for replay rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub id: RequestId,
    pub command: Command,
}

impl Request {
    #[must_use]
    pub fn new(command: Command) -> Self {
        Self {
            id: RequestId::new(),
            command,
        }
    }

    #[must_use]
    pub fn create(owner: Identity, name: impl Into<String>) -> Self {
        Self::new(Command::Create {
            owner,
            name: name.into(),
        })
    }

    #[must_use]
    pub fn deposit(target: impl Into<VaultTarget>, amount: u64, depositor: Identity) -> Self {
        Self::new(Command::Deposit {
            target: target.into(),
            amount,
            depositor,
        })
    }

    #[must_use]
    pub fn withdraw(
        vault: VaultAddress,
        amount: u64,
        recipient: Identity,
        signer: Identity,
    ) -> Self {
        Self::new(Command::Withdraw {
            vault,
            amount,
            recipient,
            signer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signer_per_command() {
        let alice = Identity::named("alice");
        let bob = Identity::named("bob");
        let vault = VaultAddress::from_bytes([4u8; 32]);

        assert_eq!(Request::create(alice, "ops").command.signer(), &alice);
        assert_eq!(Request::deposit(vault, 5, bob).command.signer(), &bob);
        assert_eq!(
            Request::withdraw(vault, 5, bob, alice).command.signer(),
            &alice
        );
    }

    #[test]
    fn operation_mapping() {
        let alice = Identity::named("alice");
        let vault = VaultAddress::from_bytes([4u8; 32]);
        assert_eq!(
            Request::create(alice, "ops").command.operation(),
            Operation::Create
        );
        assert_eq!(
            Request::withdraw(vault, 1, alice, alice).command.operation(),
            Operation::Withdraw
        );
    }

    #[test]
    fn each_request_gets_fresh_id() {
        let alice = Identity::named("alice");
        assert_ne!(
            Request::create(alice, "ops").id,
            Request::create(alice, "ops").id
        );
    }

    #[test]
    fn request_serde_roundtrip() {
        let req = Request::deposit(
            VaultTarget::Seeds {
                owner: Identity::named("alice"),
                name: "ops".to_string(),
            },
            500,
            Identity::named("bob"),
        );
        let json = serde_json::to_string(&req).unwrap();
        let back: Request = serde_json::from_str(&json).unwrap();
        assert_eq!(req, back);
    }
}
