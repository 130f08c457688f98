use thiserror::Error as ThisError;

use super::{
    ERROR_ACCESS_DENIED, ERROR_ARITHMETIC_OVERFLOW, ERROR_INSUFFICIENT_PAYMENT,
    ERROR_INSUFFICIENT_STAKE, ERROR_INVALID_AMOUNT, ERROR_INVALID_CONFIG, ERROR_NOTHING_TO_CLAIM,
    ERROR_NO_STAKE, ERROR_POOL_ALREADY_EXISTS, ERROR_POOL_CLOSED, ERROR_POOL_NOT_FOUND,
    ERROR_POOL_NOT_OPEN, ERROR_SPIN_ALREADY_PENDING, ERROR_UNKNOWN_REQUEST,
};

/// Reasons an instruction is rejected by the pool.
///
/// A rejected instruction leaves the ledger untouched (only the sender's nonce advances).
#[derive(Clone, Copy, Debug, ThisError, PartialEq, Eq)]
pub enum WheelError {
    #[error("caller is not permitted to perform this operation")]
    AccessDenied,
    #[error("pool is not open")]
    PoolNotOpen,
    #[error("payment is below the entry fee")]
    InsufficientPayment,
    #[error("player has no stake")]
    NoStake,
    #[error("stake is below the spin fee")]
    InsufficientStake,
    #[error("player already has a spin awaiting randomness")]
    SpinAlreadyPending,
    #[error("player has no winnings to claim")]
    NothingToClaim,
    #[error("no pending spin matches the request")]
    UnknownRequest,
    #[error("pool has not been created")]
    PoolNotFound,
    #[error("pool already exists")]
    PoolAlreadyExists,
    #[error("pool is closed")]
    PoolClosed,
    #[error("amount must be non-zero")]
    InvalidAmount,
    #[error("pool configuration is invalid")]
    InvalidConfig,
    #[error("arithmetic overflow")]
    ArithmeticOverflow,
}

impl WheelError {
    pub const fn code(&self) -> u8 {
        match self {
            Self::AccessDenied => ERROR_ACCESS_DENIED,
            Self::PoolNotOpen => ERROR_POOL_NOT_OPEN,
            Self::InsufficientPayment => ERROR_INSUFFICIENT_PAYMENT,
            Self::NoStake => ERROR_NO_STAKE,
            Self::InsufficientStake => ERROR_INSUFFICIENT_STAKE,
            Self::SpinAlreadyPending => ERROR_SPIN_ALREADY_PENDING,
            Self::NothingToClaim => ERROR_NOTHING_TO_CLAIM,
            Self::UnknownRequest => ERROR_UNKNOWN_REQUEST,
            Self::PoolNotFound => ERROR_POOL_NOT_FOUND,
            Self::PoolAlreadyExists => ERROR_POOL_ALREADY_EXISTS,
            Self::PoolClosed => ERROR_POOL_CLOSED,
            Self::InvalidAmount => ERROR_INVALID_AMOUNT,
            Self::InvalidConfig => ERROR_INVALID_CONFIG,
            Self::ArithmeticOverflow => ERROR_ARITHMETIC_OVERFLOW,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            ERROR_ACCESS_DENIED => Self::AccessDenied,
            ERROR_POOL_NOT_OPEN => Self::PoolNotOpen,
            ERROR_INSUFFICIENT_PAYMENT => Self::InsufficientPayment,
            ERROR_NO_STAKE => Self::NoStake,
            ERROR_INSUFFICIENT_STAKE => Self::InsufficientStake,
            ERROR_SPIN_ALREADY_PENDING => Self::SpinAlreadyPending,
            ERROR_NOTHING_TO_CLAIM => Self::NothingToClaim,
            ERROR_UNKNOWN_REQUEST => Self::UnknownRequest,
            ERROR_POOL_NOT_FOUND => Self::PoolNotFound,
            ERROR_POOL_ALREADY_EXISTS => Self::PoolAlreadyExists,
            ERROR_POOL_CLOSED => Self::PoolClosed,
            ERROR_INVALID_AMOUNT => Self::InvalidAmount,
            ERROR_INVALID_CONFIG => Self::InvalidConfig,
            ERROR_ARITHMETIC_OVERFLOW => Self::ArithmeticOverflow,
            _ => return None,
        })
    }
}
