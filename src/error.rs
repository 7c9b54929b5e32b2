use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{LoanRequestId, MemberId, TransactionId, TransactionType};

/// Rejections surfaced to the caller, plus generic persistence failures.
/// Business rejections are never retried automatically; the reason text is
/// meant for direct display.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("amount must be a positive value")]
    InvalidAmount,

    #[error("insufficient savings: available {available}, requested {requested}")]
    InsufficientSavings {
        available: Decimal,
        requested: Decimal,
    },

    #[error("insufficient shares: held {held}, requested {requested}")]
    InsufficientShares { held: Decimal, requested: Decimal },

    #[error("repayment principal {principal} exceeds outstanding loan balance {outstanding}")]
    PrincipalExceedsOutstanding {
        principal: Decimal,
        outstanding: Decimal,
    },

    #[error("member {0} not found")]
    MemberNotFound(MemberId),

    #[error("transaction {0} not found")]
    TransactionNotFound(TransactionId),

    #[error("transaction type {0} cannot be reversed")]
    UnsupportedReversalType(TransactionType),

    #[error("transaction {0} has already been reversed")]
    AlreadyReversed(TransactionId),

    #[error("no shares to distribute")]
    NoSharesToDistribute,

    #[error("loan request {0} not found")]
    LoanRequestNotFound(LoanRequestId),

    #[error("loan request {0} is not pending")]
    LoanRequestNotPending(LoanRequestId),

    /// The member's balances changed between read and write; the caller
    /// should re-read and retry.
    #[error("balances for member {0} changed concurrently")]
    StaleBalance(MemberId),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
