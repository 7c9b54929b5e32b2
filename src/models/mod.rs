pub mod dividend;
pub mod loan;
pub mod member;
pub mod transaction;

pub use dividend::{DividendAllocation, DividendDistribution};
pub use loan::{InterestType, LoanRequest, LoanRequestId, LoanRequestInput, LoanStatus};
pub use member::{Balances, Member, MemberId, NewMember};
pub use transaction::{
    CosmeticEdit, Transaction, TransactionId, TransactionRequest, TransactionType,
};
