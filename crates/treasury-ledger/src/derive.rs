//! Deterministic vault address derivation.
//!
//! A vault address is a SHA-256 hash over its seeds, namespaced by the
//! program identity:
//!
//! ```text
//! SHA-256( domain_tag || owner || name || [disambiguator] || program_id || "ProgramDerivedAddress" )
//! ```
//!
//! Disambiguators are tried from 255 downward; the first candidate the
//! host's [`AddressPredicate`] accepts is the canonical address. The default
//! predicate, [`OffCurve`], rejects any candidate that decompresses to an
//! ed25519 point, so no private key can ever sign for a vault.

use ed25519_dalek::VerifyingKey;
use sha2::{Digest, Sha256};
use treasury_types::{
    Identity, LedgerConfig, Result, TreasuryError, Vault, VaultAddress, constants,
};

/// Host-supplied acceptance rule for derived address candidates.
pub trait AddressPredicate: Send + Sync {
    /// Whether `candidate` may serve as a vault address.
    fn accepts(&self, candidate: &[u8; 32]) -> bool;
}

/// Accepts only candidates that are not valid compressed ed25519 points.
#[derive(Debug, Clone, Copy, Default)]
pub struct OffCurve;

impl AddressPredicate for OffCurve {
    fn accepts(&self, candidate: &[u8; 32]) -> bool {
        VerifyingKey::from_bytes(candidate).is_err()
    }
}

/// Pure, stateless address deriver.
pub struct AddressDeriver {
    domain_tag: Vec<u8>,
    program_id: [u8; 32],
    predicate: Box<dyn AddressPredicate>,
}

impl std::fmt::Debug for AddressDeriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressDeriver")
            .field("domain_tag", &String::from_utf8_lossy(&self.domain_tag))
            .field("program_id", &hex::encode(&self.program_id[..8]))
            .finish_non_exhaustive()
    }
}

impl AddressDeriver {
    /// Deriver with the off-curve predicate.
    #[must_use]
    pub fn new(config: &LedgerConfig) -> Self {
        Self::with_predicate(config, OffCurve)
    }

    /// Deriver with a custom acceptance predicate.
    #[must_use]
    pub fn with_predicate(config: &LedgerConfig, predicate: impl AddressPredicate + 'static) -> Self {
        Self {
            domain_tag: config.domain_tag.as_bytes().to_vec(),
            program_id: config.program_id,
            predicate: Box::new(predicate),
        }
    }

    /// Find the canonical `(address, disambiguator)` for `(owner, name)`.
    ///
    /// # Errors
    /// - `InvalidInput` if `name` exceeds one seed
    /// - `AddressSpaceExhausted` if no disambiguator is accepted
    pub fn derive(&self, owner: &Identity, name: &str) -> Result<(VaultAddress, u8)> {
        check_seed(name)?;
        for disambiguator in (0..=u8::MAX).rev() {
            let candidate = self.candidate(owner, name, disambiguator);
            if self.predicate.accepts(&candidate) {
                return Ok((VaultAddress::from_bytes(candidate), disambiguator));
            }
        }
        tracing::error!(owner = %owner, name, "no disambiguator yields an acceptable address");
        Err(TreasuryError::AddressSpaceExhausted {
            name: name.to_string(),
        })
    }

    /// Address for an explicit disambiguator, if the predicate accepts it.
    pub fn derive_with(
        &self,
        owner: &Identity,
        name: &str,
        disambiguator: u8,
    ) -> Result<Option<VaultAddress>> {
        check_seed(name)?;
        let candidate = self.candidate(owner, name, disambiguator);
        Ok(self
            .predicate
            .accepts(&candidate)
            .then(|| VaultAddress::from_bytes(candidate)))
    }

    /// Whether a stored vault's address re-derives from its own seeds.
    #[must_use]
    pub fn verify(&self, vault: &Vault) -> bool {
        matches!(
            self.derive_with(&vault.owner, &vault.name, vault.disambiguator),
            Ok(Some(address)) if address == vault.address
        )
    }

    fn candidate(&self, owner: &Identity, name: &str, disambiguator: u8) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(&self.domain_tag);
        hasher.update(owner.as_bytes());
        hasher.update(name.as_bytes());
        hasher.update([disambiguator]);
        hasher.update(self.program_id);
        hasher.update(constants::DERIVED_ADDRESS_MARKER);
        hasher.finalize().into()
    }
}

fn check_seed(name: &str) -> Result<()> {
    if name.len() > constants::MAX_SEED_LEN {
        return Err(TreasuryError::InvalidInput {
            reason: format!(
                "name is {} bytes, seeds are limited to {}",
                name.len(),
                constants::MAX_SEED_LEN
            ),
        });
    }
    Ok(())
}
