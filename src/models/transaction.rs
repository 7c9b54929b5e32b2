use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::member::MemberId;

/// Ledger transaction identifier, assigned monotonically by the store.
pub type TransactionId = u64;

/// Type of ledger movement.
///
/// The serialized form is the legacy wire string (`SAVINGS_DEPOSIT`,
/// `LOAN_DISBURSAL`, ...) and must be preserved exactly for compatibility
/// with existing records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Deposit,
    SavingsDeposit,
    Withdrawal,
    SavingsWithdrawal,
    SharePurchase,
    ShareWithdrawal,
    LoanDisbursal,
    LoanRepayment,
    LoanFine,
    Dividend,
}

impl TransactionType {
    /// The type that economically offsets this one, used by the reversal
    /// engine. Types with no counterpart (fines, dividends) cannot be
    /// reversed.
    pub fn counter_type(self) -> Option<TransactionType> {
        match self {
            TransactionType::Deposit => Some(TransactionType::Withdrawal),
            TransactionType::SavingsDeposit => Some(TransactionType::SavingsWithdrawal),
            TransactionType::Withdrawal => Some(TransactionType::Deposit),
            TransactionType::SavingsWithdrawal => Some(TransactionType::SavingsDeposit),
            TransactionType::SharePurchase => Some(TransactionType::ShareWithdrawal),
            TransactionType::ShareWithdrawal => Some(TransactionType::SharePurchase),
            TransactionType::LoanDisbursal => Some(TransactionType::LoanRepayment),
            TransactionType::LoanRepayment => Some(TransactionType::LoanDisbursal),
            TransactionType::LoanFine | TransactionType::Dividend => None,
        }
    }

    /// Wire-level string value of this type.
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::Deposit => "DEPOSIT",
            TransactionType::SavingsDeposit => "SAVINGS_DEPOSIT",
            TransactionType::Withdrawal => "WITHDRAWAL",
            TransactionType::SavingsWithdrawal => "SAVINGS_WITHDRAWAL",
            TransactionType::SharePurchase => "SHARE_PURCHASE",
            TransactionType::ShareWithdrawal => "SHARE_WITHDRAWAL",
            TransactionType::LoanDisbursal => "LOAN_DISBURSAL",
            TransactionType::LoanRepayment => "LOAN_REPAYMENT",
            TransactionType::LoanFine => "LOAN_FINE",
            TransactionType::Dividend => "DIVIDEND",
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable, append-only ledger entry.
///
/// Once committed, the monetary fields (`amount`, `tx_type`, `member_id`,
/// principal/interest split) never change. `date`, `description` and
/// `receipt_number` may be corrected through the explicit cosmetic-edit
/// path. A transaction is never deleted; its effect is undone by a reversal
/// record that references it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub member_id: MemberId,
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    /// Total monetary movement.
    pub amount: Decimal,
    /// Principal component, set on loan disbursals and repayments.
    pub principal_amount: Option<Decimal>,
    /// Interest component, set on loan disbursals and repayments.
    pub interest_amount: Option<Decimal>,
    /// Business date, distinct from record-creation time.
    pub date: NaiveDate,
    pub description: String,
    /// Human reference; not guaranteed unique.
    pub receipt_number: Option<String>,
    /// True when this record offsets another transaction.
    pub is_reversal: bool,
    /// Back-reference to the offset transaction, set only on reversals.
    pub original_transaction_id: Option<TransactionId>,
    /// Forward reference stamped on the original when a reversal commits.
    pub reversed_by: Option<TransactionId>,
}

impl Transaction {
    /// Human reference for annotations: the receipt number when present,
    /// otherwise the record id.
    pub fn reference(&self) -> String {
        self.receipt_number
            .clone()
            .unwrap_or_else(|| format!("#{}", self.id))
    }
}

/// Input for committing a new transaction through the ledger engine.
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    pub member_id: MemberId,
    pub tx_type: TransactionType,
    pub amount: Decimal,
    pub principal_amount: Option<Decimal>,
    pub interest_amount: Option<Decimal>,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub receipt_number: Option<String>,
}

impl TransactionRequest {
    /// Create a request with the required fields; everything else defaults
    /// to empty.
    pub fn new(
        member_id: MemberId,
        tx_type: TransactionType,
        amount: Decimal,
        date: NaiveDate,
    ) -> Self {
        Self {
            member_id,
            tx_type,
            amount,
            principal_amount: None,
            interest_amount: None,
            date,
            description: None,
            receipt_number: None,
        }
    }

    /// Set the principal/interest split for loan transactions.
    pub fn split(mut self, principal: Decimal, interest: Decimal) -> Self {
        self.principal_amount = Some(principal);
        self.interest_amount = Some(interest);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn receipt(mut self, receipt: impl Into<String>) -> Self {
        self.receipt_number = Some(receipt.into());
        self
    }
}

/// Cosmetic corrections allowed on a committed transaction.
///
/// Only presentation fields may change; monetary fields are immutable.
#[derive(Debug, Clone, Default)]
pub struct CosmeticEdit {
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub receipt_number: Option<String>,
}
