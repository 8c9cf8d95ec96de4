use thiserror::Error as ThisError;

use super::constants::*;

/// Reasons an instruction is rejected. Every variant aborts the whole
/// instruction; nothing it staged is committed.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum Error {
    #[error("signer is not the configuration authority")]
    NotAuthorized,
    #[error("signer does not own pass {0}")]
    NotOwner(u64),
    #[error("pass {0} does not exist")]
    PassNotFound(u64),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
    #[error("tool {0} does not exist")]
    ToolDoesNotExist(u32),
    #[error("quantity must be positive")]
    InvalidQuantity,
    #[error("tool {slot} unlocks at level {required} (current {current})")]
    ToolLocked { slot: u32, required: u32, current: u32 },
    #[error("tool {slot} is capped at {cap} units")]
    AmountMaxed { slot: u32, cap: u32 },
    #[error("tool {0} is at its maximum level")]
    LevelMaxed(u32),
    #[error("power is at its maximum tier")]
    PowerMaxed,
    #[error("evolution is at its maximum tier")]
    EvolutionMaxed,
    #[error("evolution requires {required} earned (have {earned})")]
    EvolutionLocked { required: u128, earned: u128 },
    #[error("insufficient balance: need {required}, have {available}")]
    InsufficientBalance { required: u128, available: u128 },
    #[error("epoch mismatch: live epoch is {expected}, got {got}")]
    EpochIdMismatch { expected: u64, got: u64 },
    #[error("deadline {deadline} passed at {now}")]
    DeadlineExpired { deadline: u64, now: u64 },
    #[error("price {price} exceeds max payment {max_payment}")]
    ExceedsMaxPayment { price: u128, max_payment: u128 },
    #[error("payment {payment} does not equal price {price}")]
    InvalidPayment { price: u128, payment: u128 },
    #[error("message is {length} bytes (max {max})")]
    MessageTooLong { length: usize, max: usize },
    #[error("no pooled proceeds to distribute")]
    EmptyPool,
    #[error("distribution recipients are not configured")]
    NotConfigured,
    #[error("arithmetic overflow")]
    Overflow,
}

impl Error {
    /// Stable wire code carried in error events.
    pub fn code(&self) -> u8 {
        match self {
            Self::NotAuthorized => ERROR_NOT_AUTHORIZED,
            Self::NotOwner(_) => ERROR_NOT_OWNER,
            Self::PassNotFound(_) => ERROR_PASS_NOT_FOUND,
            Self::InvalidConfiguration(_) => ERROR_INVALID_CONFIGURATION,
            Self::ToolDoesNotExist(_) => ERROR_TOOL_DOES_NOT_EXIST,
            Self::InvalidQuantity => ERROR_INVALID_QUANTITY,
            Self::ToolLocked { .. } => ERROR_TOOL_LOCKED,
            Self::AmountMaxed { .. } => ERROR_AMOUNT_MAXED,
            Self::LevelMaxed(_) => ERROR_LEVEL_MAXED,
            Self::PowerMaxed => ERROR_POWER_MAXED,
            Self::EvolutionMaxed => ERROR_EVOLUTION_MAXED,
            Self::EvolutionLocked { .. } => ERROR_EVOLUTION_LOCKED,
            Self::InsufficientBalance { .. } => ERROR_INSUFFICIENT_BALANCE,
            Self::EpochIdMismatch { .. } => ERROR_EPOCH_ID_MISMATCH,
            Self::DeadlineExpired { .. } => ERROR_DEADLINE_EXPIRED,
            Self::ExceedsMaxPayment { .. } => ERROR_EXCEEDS_MAX_PAYMENT,
            Self::InvalidPayment { .. } => ERROR_INVALID_PAYMENT,
            Self::MessageTooLong { .. } => ERROR_MESSAGE_TOO_LONG,
            Self::EmptyPool => ERROR_EMPTY_POOL,
            Self::NotConfigured => ERROR_NOT_CONFIGURED,
            Self::Overflow => ERROR_OVERFLOW,
        }
    }
}
