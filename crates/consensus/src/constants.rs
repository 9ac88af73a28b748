//! Ledger-wide constants shared across validation.

/// Default maximum serialized transaction size, in bytes.
pub const DEFAULT_MAX_TX_SIZE: u64 = 65_536;
/// Default number of transactions the local pool accepts before refusing more.
pub const DEFAULT_MEMPOOL_LIMIT: usize = 200;
/// Number of nano units in one fee coefficient unit.
pub const COEFF_NANOS_PER_UNIT: i64 = 1_000_000_000;
/// Length of an address spending root (hash160).
pub const ADDRESS_ROOT_LEN: usize = 20;
