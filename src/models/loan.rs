use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::member::MemberId;

/// Loan request identifier, assigned monotonically by the store.
pub type LoanRequestId = u64;

/// Lifecycle state of a loan request. Only `Pending` requests may
/// transition; `Disbursed` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoanStatus {
    Pending,
    Disbursed,
    Rejected,
}

/// How the interest on a loan is quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterestType {
    /// `interest_rate` percent of the principal.
    Percentage,
    /// A flat `interest_amount`.
    Fixed,
}

/// A pending ask for a loan. Disbursal creates a `LOAN_DISBURSAL`
/// transaction as a side effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRequest {
    pub id: LoanRequestId,
    pub member_id: MemberId,
    pub amount: Decimal,
    pub purpose: String,
    pub repayment_period_months: u32,
    pub status: LoanStatus,
    pub interest_type: InterestType,
    pub interest_rate: Decimal,
    pub interest_amount: Decimal,
}

/// Input for filing a new loan request.
#[derive(Debug, Clone)]
pub struct LoanRequestInput {
    pub member_id: MemberId,
    pub amount: Decimal,
    pub purpose: String,
    pub repayment_period_months: u32,
    pub interest_type: InterestType,
    /// Percent rate for `Percentage`, ignored for `Fixed`.
    pub interest_rate: Decimal,
    /// Flat amount for `Fixed`, ignored for `Percentage`.
    pub interest_amount: Decimal,
}
