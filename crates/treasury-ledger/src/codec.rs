//! Vault record codec: the single boundary between typed vaults and bytes.
//!
//! A stored record is an 8-byte type discriminator followed by the Borsh
//! encoding of the record body:
//!
//! ```text
//! V1: disc_v1[8] | name_len: u32 LE | name[name_len] | owner[32] | disambiguator: u8
//! V2: disc_v2[8] | name_len: u32 LE | name[name_len] | owner[32] | disambiguator: u8 | balance: u64 LE
//! ```
//!
//! Each layout has its own discriminator, so the version is always
//! recoverable from the bytes and one layout never decodes as the other.
//!
//! Accounts are allocated for the longest name ([`RECORD_NAME_CAPACITY`]),
//! so shorter names leave zero padding up to [`space`]. Because the name is
//! length-prefixed, the owner field does not sit at a fixed offset: use
//! [`owner_offset`] rather than hard-coding one.
//!
//! [`RECORD_NAME_CAPACITY`]: treasury_types::constants::RECORD_NAME_CAPACITY

use borsh::{BorshDeserialize, BorshSerialize};
use sha2::{Digest, Sha256};
use treasury_types::{Identity, Result, TreasuryError, Vault, VaultAddress, constants};

/// Length of the type discriminator prefix.
pub const DISCRIMINATOR_LEN: usize = 8;

const NAME_LEN_PREFIX: usize = 4;

/// Record layout versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutVersion {
    /// Name, owner, disambiguator. Balance lives in the host account.
    V1,
    /// V1 plus the balance.
    V2,
}

impl LayoutVersion {
    fn discriminator_preimage(self) -> &'static [u8] {
        match self {
            Self::V1 => b"account:Treasury",
            Self::V2 => b"account:TreasuryV2",
        }
    }
}

impl std::fmt::Display for LayoutVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::V1 => write!(f, "V1"),
            Self::V2 => write!(f, "V2"),
        }
    }
}

/// Decoded record body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultRecord {
    pub name: String,
    pub owner: Identity,
    pub disambiguator: u8,
    /// Present only in V2 records.
    pub balance: Option<u64>,
}

impl VaultRecord {
    /// Combine with the account address and balance into a [`Vault`].
    #[must_use]
    pub fn into_vault(self, address: VaultAddress, balance: u64) -> Vault {
        Vault {
            address,
            name: self.name,
            owner: self.owner,
            disambiguator: self.disambiguator,
            balance,
        }
    }
}

#[derive(BorshSerialize, BorshDeserialize)]
struct BodyV1 {
    name: String,
    owner: [u8; 32],
    disambiguator: u8,
}

#[derive(BorshSerialize, BorshDeserialize)]
struct BodyV2 {
    name: String,
    owner: [u8; 32],
    disambiguator: u8,
    balance: u64,
}

/// Type discriminator: first 8 bytes of `SHA-256("account:Treasury")` for
/// V1 and of `SHA-256("account:TreasuryV2")` for V2.
#[must_use]
pub fn discriminator(version: LayoutVersion) -> [u8; DISCRIMINATOR_LEN] {
    let hash = Sha256::digest(version.discriminator_preimage());
    let mut disc = [0u8; DISCRIMINATOR_LEN];
    disc.copy_from_slice(&hash[..DISCRIMINATOR_LEN]);
    disc
}

/// Bytes reserved for a record of this version.
#[must_use]
pub fn space(version: LayoutVersion) -> usize {
    let v1 = DISCRIMINATOR_LEN + NAME_LEN_PREFIX + constants::RECORD_NAME_CAPACITY + 32 + 1;
    match version {
        LayoutVersion::V1 => v1,
        LayoutVersion::V2 => v1 + 8,
    }
}

/// Encode a vault as a record (unpadded).
///
/// # Errors
/// Returns `Codec` if the name exceeds the record's name capacity.
pub fn encode(vault: &Vault, version: LayoutVersion) -> Result<Vec<u8>> {
    check_name_capacity(vault.name.len())?;
    let body = match version {
        LayoutVersion::V1 => borsh::to_vec(&BodyV1 {
            name: vault.name.clone(),
            owner: vault.owner.0,
            disambiguator: vault.disambiguator,
        }),
        LayoutVersion::V2 => borsh::to_vec(&BodyV2 {
            name: vault.name.clone(),
            owner: vault.owner.0,
            disambiguator: vault.disambiguator,
            balance: vault.balance,
        }),
    }
    .map_err(|e| TreasuryError::Codec(e.to_string()))?;

    let mut bytes = Vec::with_capacity(DISCRIMINATOR_LEN + body.len());
    bytes.extend_from_slice(&discriminator(version));
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

/// Decode a record of the given layout. Zero padding up to
/// [`space`]`(version)` is accepted; any other trailing byte is rejected.
///
/// # Errors
/// Returns `Codec` on a discriminator of another layout (or none),
/// truncation, an oversize or non-UTF-8 name, a record longer than
/// `space(version)`, or non-zero trailing bytes.
pub fn decode(bytes: &[u8], version: LayoutVersion) -> Result<VaultRecord> {
    let (found, body) = strip_discriminator(bytes)?;
    if found != version {
        return Err(TreasuryError::Codec(format!(
            "record has layout {found}, expected {version}"
        )));
    }
    if bytes.len() > space(version) {
        return Err(TreasuryError::Codec(format!(
            "record of {} bytes exceeds {version} space of {}",
            bytes.len(),
            space(version)
        )));
    }
    let name_len = read_name_len(body)?;
    check_name_capacity(name_len)?;

    let mut cursor = body;
    let record = match version {
        LayoutVersion::V1 => {
            let b = BodyV1::deserialize(&mut cursor).map_err(|e| TreasuryError::Codec(e.to_string()))?;
            VaultRecord {
                name: b.name,
                owner: Identity::from_bytes(b.owner),
                disambiguator: b.disambiguator,
                balance: None,
            }
        }
        LayoutVersion::V2 => {
            let b = BodyV2::deserialize(&mut cursor).map_err(|e| TreasuryError::Codec(e.to_string()))?;
            VaultRecord {
                name: b.name,
                owner: Identity::from_bytes(b.owner),
                disambiguator: b.disambiguator,
                balance: Some(b.balance),
            }
        }
    };

    if cursor.iter().any(|&b| b != 0) {
        return Err(TreasuryError::Codec(format!(
            "{} unexpected trailing bytes",
            cursor.len()
        )));
    }
    Ok(record)
}

/// Layout of an encoded record, read from its discriminator.
pub fn layout_of(bytes: &[u8]) -> Result<LayoutVersion> {
    Ok(strip_discriminator(bytes)?.0)
}

/// Byte offset of the owner field, computed from the encoded name length.
///
/// Identical in V1 and V2.
pub fn owner_offset(bytes: &[u8]) -> Result<usize> {
    let (_, body) = strip_discriminator(bytes)?;
    let name_len = read_name_len(body)?;
    check_name_capacity(name_len)?;
    let offset = DISCRIMINATOR_LEN + NAME_LEN_PREFIX + name_len;
    if bytes.len() < offset + 32 {
        return Err(TreasuryError::Codec("record truncated before owner".to_string()));
    }
    Ok(offset)
}

/// Read just the owner without decoding the rest of the record.
pub fn read_owner(bytes: &[u8]) -> Result<Identity> {
    let offset = owner_offset(bytes)?;
    let mut owner = [0u8; 32];
    owner.copy_from_slice(&bytes[offset..offset + 32]);
    Ok(Identity::from_bytes(owner))
}

fn strip_discriminator(bytes: &[u8]) -> Result<(LayoutVersion, &[u8])> {
    if bytes.len() < DISCRIMINATOR_LEN {
        return Err(TreasuryError::Codec("record shorter than discriminator".to_string()));
    }
    let (disc, body) = bytes.split_at(DISCRIMINATOR_LEN);
    [LayoutVersion::V1, LayoutVersion::V2]
        .into_iter()
        .find(|version| disc == discriminator(*version))
        .map(|version| (version, body))
        .ok_or_else(|| TreasuryError::Codec("unknown record discriminator".to_string()))
}

fn read_name_len(body: &[u8]) -> Result<usize> {
    let prefix: [u8; NAME_LEN_PREFIX] = body
        .get(..NAME_LEN_PREFIX)
        .and_then(|p| p.try_into().ok())
        .ok_or_else(|| TreasuryError::Codec("record truncated before name".to_string()))?;
    usize::try_from(u32::from_le_bytes(prefix))
        .map_err(|_| TreasuryError::Codec("name length out of range".to_string()))
}

fn check_name_capacity(len: usize) -> Result<()> {
    if len > constants::RECORD_NAME_CAPACITY {
        return Err(TreasuryError::Codec(format!(
            "name of {len} bytes exceeds record capacity {}",
            constants::RECORD_NAME_CAPACITY
        )));
    }
    Ok(())
}
