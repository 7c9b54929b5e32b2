//! Persistence seam for the ledger engine.
//!
//! `LedgerStore` is the collaborator the engine writes through. Its central
//! contract is `apply`: one `WriteBatch` is all-or-nothing, and it is the
//! *only* path that may write a member's cached `total_*` balances. Every
//! balance write carries the expected prior balances; a store must refuse
//! the whole batch when they no longer match, which turns concurrent
//! lost-update races into an explicit `StaleBalance` rejection the caller
//! can retry.
//!
//! `MemoryStore` is the in-memory implementation used in development and
//! tests, standing in for the database-backed store of a deployment. It
//! gets atomicity by validating the entire batch against staged state
//! before mutating anything.

use std::collections::{BTreeMap, HashMap};

use anyhow::anyhow;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::error::{LedgerError, Result};
use crate::models::{
    Balances, CosmeticEdit, DividendDistribution, LoanRequest, LoanRequestId, LoanRequestInput,
    LoanStatus, Member, MemberId, NewMember, Transaction, TransactionId, TransactionType,
};

/// A transaction about to be inserted; the store assigns its id.
#[derive(Debug, Clone)]
pub struct PendingTransaction {
    pub member_id: MemberId,
    pub tx_type: TransactionType,
    pub amount: Decimal,
    pub principal_amount: Option<Decimal>,
    pub interest_amount: Option<Decimal>,
    pub date: NaiveDate,
    pub description: String,
    pub receipt_number: Option<String>,
    pub is_reversal: bool,
    pub original_transaction_id: Option<TransactionId>,
}

/// One atomic ledger mutation: insert a transaction and move its owner's
/// cached balances from `expected` to `after`.
#[derive(Debug, Clone)]
pub struct BalanceWrite {
    pub transaction: PendingTransaction,
    /// Balances read before the mutation; the compare-and-swap guard.
    pub expected: Balances,
    /// Balances after applying the transaction's delta.
    pub after: Balances,
}

/// Summary record accompanying a dividend run.
#[derive(Debug, Clone)]
pub struct NewDistribution {
    pub year: i32,
    pub total_amount: Decimal,
    pub total_members: u32,
    pub distribution_method: String,
}

/// The unit of atomicity: every part of a batch commits, or none of it.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    pub writes: Vec<BalanceWrite>,
    pub distribution: Option<NewDistribution>,
    pub loan_transition: Option<(LoanRequestId, LoanStatus)>,
}

impl WriteBatch {
    /// Batch containing a single balance write.
    pub fn single(write: BalanceWrite) -> Self {
        WriteBatch {
            writes: vec![write],
            ..Default::default()
        }
    }
}

/// Storage collaborator with transactional (all-or-nothing) semantics for
/// multi-write operations.
pub trait LedgerStore {
    fn find_member(&self, id: MemberId) -> Option<Member>;

    fn find_member_by_account(&self, account_number: &str) -> Option<Member>;

    /// All members, ordered by id.
    fn members(&self) -> Vec<Member>;

    /// Register a member with zero balances. Fails on a duplicate account
    /// number.
    fn create_member(&mut self, member: NewMember) -> Result<Member>;

    fn find_transaction(&self, id: TransactionId) -> Option<Transaction>;

    /// A member's full transaction log, ordered by id.
    fn member_transactions(&self, member_id: MemberId) -> Vec<Transaction>;

    /// Correct the presentation fields of a committed transaction. Monetary
    /// fields are untouchable by contract.
    fn update_transaction_cosmetics(
        &mut self,
        id: TransactionId,
        edit: &CosmeticEdit,
    ) -> Result<Transaction>;

    fn find_loan_request(&self, id: LoanRequestId) -> Option<LoanRequest>;

    fn create_loan_request(&mut self, input: LoanRequestInput) -> Result<LoanRequest>;

    /// Flip a loan request's status outside of a batch (rejection path).
    fn set_loan_status(&mut self, id: LoanRequestId, status: LoanStatus) -> Result<LoanRequest>;

    /// Executed dividend runs, oldest first.
    fn distributions(&self) -> Vec<DividendDistribution>;

    /// Apply a batch atomically and return the inserted transactions in
    /// batch order. On reversal writes the store also stamps the original
    /// transaction's `reversed_by` field.
    fn apply(&mut self, batch: WriteBatch) -> Result<Vec<Transaction>>;
}

/// In-memory store, mirroring the hand-rolled mock the web application uses
/// in development.
#[derive(Debug, Default)]
pub struct MemoryStore {
    members: HashMap<MemberId, Member>,
    transactions: BTreeMap<TransactionId, Transaction>,
    loan_requests: HashMap<LoanRequestId, LoanRequest>,
    distributions: Vec<DividendDistribution>,
    next_member_id: MemberId,
    next_transaction_id: TransactionId,
    next_loan_request_id: LoanRequestId,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for MemoryStore {
    fn find_member(&self, id: MemberId) -> Option<Member> {
        self.members.get(&id).cloned()
    }

    fn find_member_by_account(&self, account_number: &str) -> Option<Member> {
        self.members
            .values()
            .find(|m| m.account_number == account_number)
            .cloned()
    }

    fn members(&self) -> Vec<Member> {
        let mut members: Vec<Member> = self.members.values().cloned().collect();
        members.sort_by_key(|m| m.id);
        members
    }

    fn create_member(&mut self, member: NewMember) -> Result<Member> {
        if self.find_member_by_account(&member.account_number).is_some() {
            return Err(LedgerError::Storage(anyhow!(
                "account number '{}' already registered",
                member.account_number
            )));
        }

        self.next_member_id += 1;
        let member = Member {
            id: self.next_member_id,
            account_number: member.account_number,
            name: member.name,
            total_savings: Decimal::ZERO,
            total_shares: Decimal::ZERO,
            total_loans: Decimal::ZERO,
        };
        self.members.insert(member.id, member.clone());
        Ok(member)
    }

    fn find_transaction(&self, id: TransactionId) -> Option<Transaction> {
        self.transactions.get(&id).cloned()
    }

    fn member_transactions(&self, member_id: MemberId) -> Vec<Transaction> {
        self.transactions
            .values()
            .filter(|tx| tx.member_id == member_id)
            .cloned()
            .collect()
    }

    fn update_transaction_cosmetics(
        &mut self,
        id: TransactionId,
        edit: &CosmeticEdit,
    ) -> Result<Transaction> {
        let tx = self
            .transactions
            .get_mut(&id)
            .ok_or(LedgerError::TransactionNotFound(id))?;

        if let Some(date) = edit.date {
            tx.date = date;
        }
        if let Some(description) = &edit.description {
            tx.description = description.clone();
        }
        if let Some(receipt) = &edit.receipt_number {
            tx.receipt_number = Some(receipt.clone());
        }
        Ok(tx.clone())
    }

    fn find_loan_request(&self, id: LoanRequestId) -> Option<LoanRequest> {
        self.loan_requests.get(&id).cloned()
    }

    fn create_loan_request(&mut self, input: LoanRequestInput) -> Result<LoanRequest> {
        if !self.members.contains_key(&input.member_id) {
            return Err(LedgerError::MemberNotFound(input.member_id));
        }

        self.next_loan_request_id += 1;
        let request = LoanRequest {
            id: self.next_loan_request_id,
            member_id: input.member_id,
            amount: input.amount,
            purpose: input.purpose,
            repayment_period_months: input.repayment_period_months,
            status: LoanStatus::Pending,
            interest_type: input.interest_type,
            interest_rate: input.interest_rate,
            interest_amount: input.interest_amount,
        };
        self.loan_requests.insert(request.id, request.clone());
        Ok(request)
    }

    fn set_loan_status(&mut self, id: LoanRequestId, status: LoanStatus) -> Result<LoanRequest> {
        let request = self
            .loan_requests
            .get_mut(&id)
            .ok_or(LedgerError::LoanRequestNotFound(id))?;
        request.status = status;
        Ok(request.clone())
    }

    fn distributions(&self) -> Vec<DividendDistribution> {
        self.distributions.clone()
    }

    fn apply(&mut self, batch: WriteBatch) -> Result<Vec<Transaction>> {
        // Validate the whole batch against staged state before mutating
        // anything; this is what makes the batch all-or-nothing.
        let mut staged: HashMap<MemberId, Balances> = HashMap::new();

        for write in &batch.writes {
            let member = self
                .members
                .get(&write.transaction.member_id)
                .ok_or(LedgerError::MemberNotFound(write.transaction.member_id))?;

            let current = staged
                .get(&member.id)
                .copied()
                .unwrap_or_else(|| member.balances());
            if current != write.expected {
                return Err(LedgerError::StaleBalance(member.id));
            }
            staged.insert(member.id, write.after);

            if let Some(original_id) = write.transaction.original_transaction_id {
                if !self.transactions.contains_key(&original_id) {
                    return Err(LedgerError::TransactionNotFound(original_id));
                }
            }
        }

        if let Some((request_id, _)) = batch.loan_transition {
            if !self.loan_requests.contains_key(&request_id) {
                return Err(LedgerError::LoanRequestNotFound(request_id));
            }
        }

        // Commit.
        let mut inserted = Vec::with_capacity(batch.writes.len());
        for write in batch.writes {
            self.next_transaction_id += 1;
            let tx = Transaction {
                id: self.next_transaction_id,
                member_id: write.transaction.member_id,
                tx_type: write.transaction.tx_type,
                amount: write.transaction.amount,
                principal_amount: write.transaction.principal_amount,
                interest_amount: write.transaction.interest_amount,
                date: write.transaction.date,
                description: write.transaction.description,
                receipt_number: write.transaction.receipt_number,
                is_reversal: write.transaction.is_reversal,
                original_transaction_id: write.transaction.original_transaction_id,
                reversed_by: None,
            };

            if write.transaction.is_reversal {
                if let Some(original_id) = tx.original_transaction_id {
                    if let Some(original) = self.transactions.get_mut(&original_id) {
                        original.reversed_by = Some(tx.id);
                    }
                }
            }

            let member = self
                .members
                .get_mut(&tx.member_id)
                .expect("member checked above");
            member.total_savings = write.after.savings;
            member.total_shares = write.after.shares;
            member.total_loans = write.after.loans;

            self.transactions.insert(tx.id, tx.clone());
            inserted.push(tx);
        }

        if let Some((request_id, status)) = batch.loan_transition {
            if let Some(request) = self.loan_requests.get_mut(&request_id) {
                request.status = status;
            }
        }

        if let Some(distribution) = batch.distribution {
            let record = DividendDistribution {
                id: self.distributions.len() as u64 + 1,
                year: distribution.year,
                total_amount: distribution.total_amount,
                total_members: distribution.total_members,
                distribution_method: distribution.distribution_method,
                executed_at: Utc::now(),
            };
            self.distributions.push(record);
        }

        Ok(inserted)
    }
}
