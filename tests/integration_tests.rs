mod common;

use common::{date, engine_with_member, savings_deposit};
use coop_ledger::models::{
    Balances, CosmeticEdit, LoanRequest, LoanRequestId, LoanRequestInput, LoanStatus, Member,
    MemberId, NewMember, Transaction, TransactionId, TransactionRequest, TransactionType,
};
use coop_ledger::store::{BalanceWrite, LedgerStore, PendingTransaction, WriteBatch};
use coop_ledger::{DividendDistribution, InterestType, LedgerEngine, LedgerError, MemoryStore};
use rust_decimal_macros::dec;

#[test]
fn test_member_journey_end_to_end() {
    let mut engine = LedgerEngine::in_memory();
    let alice = engine
        .register_member(NewMember {
            account_number: "ACC-100".to_string(),
            name: "Alice".to_string(),
        })
        .unwrap();
    let bob = engine
        .register_member(NewMember {
            account_number: "ACC-200".to_string(),
            name: "Bob".to_string(),
        })
        .unwrap();

    // Savings and shares build up over January.
    engine
        .commit_transaction(TransactionRequest::new(
            alice.id,
            TransactionType::SavingsDeposit,
            dec!(1000),
            date(2024, 1, 5),
        ))
        .unwrap();
    engine
        .commit_transaction(TransactionRequest::new(
            alice.id,
            TransactionType::SharePurchase,
            dec!(400),
            date(2024, 1, 10),
        ))
        .unwrap();
    engine
        .commit_transaction(TransactionRequest::new(
            bob.id,
            TransactionType::SharePurchase,
            dec!(600),
            date(2024, 1, 12),
        ))
        .unwrap();

    // Alice takes a loan at 10% and repays part of it.
    let request = engine
        .create_loan_request(LoanRequestInput {
            member_id: alice.id,
            amount: dec!(2000),
            purpose: "inventory".to_string(),
            repayment_period_months: 10,
            interest_type: InterestType::Percentage,
            interest_rate: dec!(10),
            interest_amount: dec!(0),
        })
        .unwrap();
    engine
        .disburse_loan(request.id, date(2024, 2, 1), None)
        .unwrap();
    engine
        .commit_transaction(
            TransactionRequest::new(
                alice.id,
                TransactionType::LoanRepayment,
                dec!(550),
                date(2024, 3, 1),
            )
            .split(dec!(500), dec!(50)),
        )
        .unwrap();

    // Year-end dividend on the 400/600 share split.
    engine.execute_dividend(dec!(500), 2024).unwrap();

    let alice = engine.member(alice.id).unwrap();
    assert_eq!(alice.total_savings, dec!(1200.00)); // 1000 + 200 dividend
    assert_eq!(alice.total_shares, dec!(400));
    assert_eq!(alice.total_loans, dec!(1700.00)); // 2000 + 200 - 500

    let bob = engine.member(bob.id).unwrap();
    assert_eq!(bob.total_savings, dec!(300.00));
    assert_eq!(bob.total_shares, dec!(600));

    // The cached view and the log agree for everyone.
    assert!(engine.reconcile(alice.id).unwrap().is_consistent());
    assert!(engine.reconcile(bob.id).unwrap().is_consistent());

    // The statement timeline ends at the cached balances.
    let timeline = engine.project_timeline(alice.id).unwrap();
    let last = timeline.last().unwrap();
    assert_eq!(last.running, alice.balances());
}

#[test]
fn test_transaction_type_wire_strings_are_stable() {
    let cases = [
        (TransactionType::Deposit, "\"DEPOSIT\""),
        (TransactionType::SavingsDeposit, "\"SAVINGS_DEPOSIT\""),
        (TransactionType::Withdrawal, "\"WITHDRAWAL\""),
        (TransactionType::SavingsWithdrawal, "\"SAVINGS_WITHDRAWAL\""),
        (TransactionType::SharePurchase, "\"SHARE_PURCHASE\""),
        (TransactionType::ShareWithdrawal, "\"SHARE_WITHDRAWAL\""),
        (TransactionType::LoanDisbursal, "\"LOAN_DISBURSAL\""),
        (TransactionType::LoanRepayment, "\"LOAN_REPAYMENT\""),
        (TransactionType::LoanFine, "\"LOAN_FINE\""),
        (TransactionType::Dividend, "\"DIVIDEND\""),
    ];
    for (tx_type, wire) in cases {
        assert_eq!(serde_json::to_string(&tx_type).unwrap(), wire);
        assert_eq!(
            serde_json::from_str::<TransactionType>(wire).unwrap(),
            tx_type
        );
    }
}

#[test]
fn test_transaction_serializes_type_under_legacy_key() {
    let (mut engine, member_id) = engine_with_member("ACC-001");
    let tx = engine
        .commit_transaction(savings_deposit(member_id, dec!(100)))
        .unwrap();

    let value = serde_json::to_value(&tx).unwrap();
    assert_eq!(value["type"], "SAVINGS_DEPOSIT");
    assert!(value.get("tx_type").is_none());
}

#[test]
fn test_duplicate_account_number_rejected() {
    let mut engine = LedgerEngine::in_memory();
    engine
        .register_member(NewMember {
            account_number: "ACC-001".to_string(),
            name: "First".to_string(),
        })
        .unwrap();

    let result = engine.register_member(NewMember {
        account_number: "ACC-001".to_string(),
        name: "Second".to_string(),
    });
    assert!(matches!(result, Err(LedgerError::Storage(_))));
}

#[test]
fn test_stale_expected_balances_rejected() {
    let mut store = MemoryStore::new();
    let member = store
        .create_member(NewMember {
            account_number: "ACC-001".to_string(),
            name: "Test".to_string(),
        })
        .unwrap();

    // Writer read balances, but they changed before the write: the store
    // refuses instead of silently losing the earlier update.
    let stale = Balances {
        savings: dec!(50),
        shares: dec!(0),
        loans: dec!(0),
    };
    let result = store.apply(WriteBatch::single(BalanceWrite {
        transaction: PendingTransaction {
            member_id: member.id,
            tx_type: TransactionType::SavingsDeposit,
            amount: dec!(100),
            principal_amount: None,
            interest_amount: None,
            date: date(2024, 1, 1),
            description: String::new(),
            receipt_number: None,
            is_reversal: false,
            original_transaction_id: None,
        },
        expected: stale,
        after: Balances {
            savings: dec!(150),
            shares: dec!(0),
            loans: dec!(0),
        },
    }));

    assert!(matches!(result, Err(LedgerError::StaleBalance(_))));
    assert!(store.member_transactions(member.id).is_empty());
    assert_eq!(store.find_member(member.id).unwrap().total_savings, dec!(0));
}

/// Store wrapper that refuses any batch carrying a distribution record,
/// simulating a storage failure mid-dividend.
struct FailingStore {
    inner: MemoryStore,
}

impl LedgerStore for FailingStore {
    fn find_member(&self, id: MemberId) -> Option<Member> {
        self.inner.find_member(id)
    }

    fn find_member_by_account(&self, account_number: &str) -> Option<Member> {
        self.inner.find_member_by_account(account_number)
    }

    fn members(&self) -> Vec<Member> {
        self.inner.members()
    }

    fn create_member(&mut self, member: NewMember) -> coop_ledger::Result<Member> {
        self.inner.create_member(member)
    }

    fn find_transaction(&self, id: TransactionId) -> Option<Transaction> {
        self.inner.find_transaction(id)
    }

    fn member_transactions(&self, member_id: MemberId) -> Vec<Transaction> {
        self.inner.member_transactions(member_id)
    }

    fn update_transaction_cosmetics(
        &mut self,
        id: TransactionId,
        edit: &CosmeticEdit,
    ) -> coop_ledger::Result<Transaction> {
        self.inner.update_transaction_cosmetics(id, edit)
    }

    fn find_loan_request(&self, id: LoanRequestId) -> Option<LoanRequest> {
        self.inner.find_loan_request(id)
    }

    fn create_loan_request(&mut self, input: LoanRequestInput) -> coop_ledger::Result<LoanRequest> {
        self.inner.create_loan_request(input)
    }

    fn set_loan_status(
        &mut self,
        id: LoanRequestId,
        status: LoanStatus,
    ) -> coop_ledger::Result<LoanRequest> {
        self.inner.set_loan_status(id, status)
    }

    fn distributions(&self) -> Vec<DividendDistribution> {
        self.inner.distributions()
    }

    fn apply(&mut self, batch: WriteBatch) -> coop_ledger::Result<Vec<Transaction>> {
        if batch.distribution.is_some() {
            return Err(LedgerError::Storage(anyhow::anyhow!(
                "connection lost during distribution"
            )));
        }
        self.inner.apply(batch)
    }
}

#[test]
fn test_failed_dividend_leaves_no_partial_state() {
    let mut engine = LedgerEngine::new(FailingStore {
        inner: MemoryStore::new(),
    });
    let alice = engine
        .register_member(NewMember {
            account_number: "ACC-A".to_string(),
            name: "Alice".to_string(),
        })
        .unwrap();
    let bob = engine
        .register_member(NewMember {
            account_number: "ACC-B".to_string(),
            name: "Bob".to_string(),
        })
        .unwrap();
    for member_id in [alice.id, bob.id] {
        engine
            .commit_transaction(TransactionRequest::new(
                member_id,
                TransactionType::SharePurchase,
                dec!(500),
                date(2024, 1, 1),
            ))
            .unwrap();
    }

    let result = engine.execute_dividend(dec!(1000), 2024);
    assert!(matches!(result, Err(LedgerError::Storage(_))));

    // Nobody was paid, no run was recorded.
    for member_id in [alice.id, bob.id] {
        let member = engine.member(member_id).unwrap();
        assert_eq!(member.total_savings, dec!(0));
        assert!(engine
            .store()
            .member_transactions(member_id)
            .iter()
            .all(|tx| tx.tx_type != TransactionType::Dividend));
    }
    assert!(engine.store().distributions().is_empty());
}

#[test]
fn test_rejected_commit_then_retry_succeeds() {
    let (mut engine, member_id) = engine_with_member("ACC-001");

    // A rejection leaves the engine fully usable.
    assert!(engine
        .commit_transaction(TransactionRequest::new(
            member_id,
            TransactionType::SavingsWithdrawal,
            dec!(10),
            date(2024, 1, 2),
        ))
        .is_err());

    engine
        .commit_transaction(savings_deposit(member_id, dec!(10)))
        .unwrap();
    engine
        .commit_transaction(TransactionRequest::new(
            member_id,
            TransactionType::SavingsWithdrawal,
            dec!(10),
            date(2024, 1, 2),
        ))
        .unwrap();
    assert_eq!(engine.member(member_id).unwrap().total_savings, dec!(0));
}
