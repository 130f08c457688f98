/// Multiple of the entry fee the house must hold before the pool opens.
pub const FUNDING_THRESHOLD_MULTIPLE: u64 = 10;

/// Spin fees credited back to the stake when a free spin lands.
pub const FREE_SPIN_MULTIPLE: u64 = 10;

/// Number of equally likely tiers on the wheel.
pub const PRIZE_COUNT: usize = 10;

/// Entry fee used by the local relay session when none is configured (1 unit, 9 decimals).
pub const DEFAULT_ENTRY_FEE: u64 = 1_000_000_000;

/// Spin fee used by the local relay session when none is configured (0.1 unit).
pub const DEFAULT_SPIN_FEE: u64 = 100_000_000;

/// Maximum length of a rejection message carried in an event.
pub const MAX_MESSAGE_LENGTH: usize = 256;

/// Domain tag mixed into request identifiers.
pub const REQUEST_SUFFIX: &[u8] = b"_REQUEST";

/// Domain tag mixed into hash-chain randomness.
pub const RANDOMNESS_DOMAIN: &[u8] = b"randomness";

// Error codes carried by rejected transactions
pub const ERROR_ACCESS_DENIED: u8 = 1;
pub const ERROR_POOL_NOT_OPEN: u8 = 2;
pub const ERROR_INSUFFICIENT_PAYMENT: u8 = 3;
pub const ERROR_NO_STAKE: u8 = 4;
pub const ERROR_INSUFFICIENT_STAKE: u8 = 5;
pub const ERROR_SPIN_ALREADY_PENDING: u8 = 6;
pub const ERROR_NOTHING_TO_CLAIM: u8 = 7;
pub const ERROR_UNKNOWN_REQUEST: u8 = 8;
pub const ERROR_POOL_NOT_FOUND: u8 = 9;
pub const ERROR_POOL_ALREADY_EXISTS: u8 = 10;
pub const ERROR_POOL_CLOSED: u8 = 11;
pub const ERROR_INVALID_AMOUNT: u8 = 12;
pub const ERROR_INVALID_CONFIG: u8 = 13;
pub const ERROR_ARITHMETIC_OVERFLOW: u8 = 14;
