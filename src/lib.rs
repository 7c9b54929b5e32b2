//! Ledger engine for cooperative/mutual-fund bookkeeping.
//!
//! Keeps three running balances per member (savings, shares, loans)
//! consistent with an append-only transaction log: validation before
//! commit, atomic balance mutation, reversal by counter-transaction and
//! pro-rata dividend distribution. API handlers, rendering and session
//! management live upstream; this crate only owns the ledger rules.

pub mod audit;
pub mod concurrent;
pub mod engine;
pub mod error;
pub mod models;
pub mod projector;
pub mod store;
pub mod validator;

pub use concurrent::SharedLedger;
pub use engine::{LedgerEngine, Reconciliation, DISTRIBUTION_METHOD};
pub use error::{LedgerError, Result};
pub use models::{
    Balances, CosmeticEdit, DividendAllocation, DividendDistribution, InterestType, LoanRequest,
    LoanRequestInput, LoanStatus, Member, NewMember, Transaction, TransactionRequest,
    TransactionType,
};
pub use store::{LedgerStore, MemoryStore, WriteBatch};
