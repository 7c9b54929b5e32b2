// Not every test binary uses every helper.
#![allow(dead_code)]

use chrono::NaiveDate;
use coop_ledger::models::{MemberId, NewMember, TransactionRequest, TransactionType};
use coop_ledger::{LedgerEngine, MemoryStore};
use rust_decimal::Decimal;

/// Shorthand for a business date.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// Engine over a fresh in-memory store with one registered member.
pub fn engine_with_member(account_number: &str) -> (LedgerEngine<MemoryStore>, MemberId) {
    let mut engine = LedgerEngine::in_memory();
    let member = engine
        .register_member(NewMember {
            account_number: account_number.to_string(),
            name: format!("Member {account_number}"),
        })
        .expect("member registration");
    (engine, member.id)
}

/// Register an additional member on an existing engine.
pub fn add_member(engine: &mut LedgerEngine<MemoryStore>, account_number: &str) -> MemberId {
    engine
        .register_member(NewMember {
            account_number: account_number.to_string(),
            name: format!("Member {account_number}"),
        })
        .expect("member registration")
        .id
}

pub fn savings_deposit(member_id: MemberId, amount: Decimal) -> TransactionRequest {
    TransactionRequest::new(
        member_id,
        TransactionType::SavingsDeposit,
        amount,
        date(2024, 1, 15),
    )
}

pub fn savings_withdrawal(member_id: MemberId, amount: Decimal) -> TransactionRequest {
    TransactionRequest::new(
        member_id,
        TransactionType::SavingsWithdrawal,
        amount,
        date(2024, 1, 20),
    )
}

pub fn share_purchase(member_id: MemberId, amount: Decimal) -> TransactionRequest {
    TransactionRequest::new(
        member_id,
        TransactionType::SharePurchase,
        amount,
        date(2024, 1, 16),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_engine_with_member_starts_empty() {
        let (engine, member_id) = engine_with_member("ACC-001");
        let member = engine.member(member_id).unwrap();
        assert_eq!(member.total_savings, dec!(0));
        assert_eq!(member.total_shares, dec!(0));
        assert_eq!(member.total_loans, dec!(0));
    }

    #[test]
    fn test_savings_deposit_builder() {
        let request = savings_deposit(1, dec!(100));
        assert_eq!(request.member_id, 1);
        assert_eq!(request.amount, dec!(100));
        assert!(matches!(request.tx_type, TransactionType::SavingsDeposit));
    }
}
