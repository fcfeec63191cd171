//! System-wide constants for the treasury vault ledger.

/// Maximum length of a single address-derivation seed, in bytes.
pub const MAX_SEED_LEN: usize = 32;

/// Default maximum vault name length in bytes (one full seed).
pub const DEFAULT_MAX_NAME_LEN: usize = MAX_SEED_LEN;

/// Name capacity reserved in a stored vault record, in bytes.
pub const RECORD_NAME_CAPACITY: usize = 50;

/// Default domain tag mixed into every vault address.
pub const DEFAULT_DOMAIN_TAG: &str = "treasury";

/// Marker appended to every address-derivation preimage.
pub const DERIVED_ADDRESS_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Default program identity that namespaces derived addresses: the
/// decoded key of `4fmeXVrnzWs6hTRM6rYLaYk26FzPxRmBFkHUmp9Vw3cV`.
pub const DEFAULT_PROGRAM_ID: [u8; 32] = [
    0x36, 0x81, 0x9d, 0x32, 0x00, 0xdb, 0xd4, 0x33, 0x1c, 0x59, 0xc0, 0x36, 0x4f, 0x3b, 0x46,
    0x78, 0x28, 0x38, 0x48, 0xa6, 0x07, 0x2a, 0xdb, 0x9a, 0x5d, 0x63, 0x8d, 0xa0, 0x2f, 0x78,
    0xcc, 0x42,
];

/// Default reserve floor in base units (no floor).
pub const DEFAULT_RESERVE_FLOOR: u64 = 0;

/// Base units per whole display coin.
pub const BASE_UNITS_PER_COIN: u64 = 1_000_000_000;

/// Decimal places between display coins and base units.
pub const BASE_UNIT_DECIMALS: u32 = 9;

/// Number of processed request IDs remembered for replay rejection.
pub const DEFAULT_REPLAY_CACHE_SIZE: usize = 100_000;
