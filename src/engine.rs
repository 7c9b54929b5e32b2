//! The ledger engine: the single mutation path for member balances.
//!
//! Every balance movement goes through `commit_transaction` (or one of the
//! operations built on it: reversal, dividend execution, loan disbursal),
//! which validates against the cached balances and then applies one atomic
//! write batch through the store. The cached balances are a materialized
//! view of the transaction log; `reconcile` checks the two against each
//! other.

use anyhow::anyhow;
use chrono::{NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::json;
use tracing::{debug, warn};

use crate::audit::{AuditEntry, AuditSink, IdentityProvider, SystemIdentity, TracingAuditSink};
use crate::error::{LedgerError, Result};
use crate::models::{
    Balances, CosmeticEdit, DividendAllocation, DividendDistribution, InterestType, LoanRequest,
    LoanRequestId, LoanRequestInput, LoanStatus, Member, MemberId, NewMember, Transaction,
    TransactionId, TransactionRequest, TransactionType,
};
use crate::projector::{self, TimelineEntry};
use crate::store::{BalanceWrite, LedgerStore, NewDistribution, PendingTransaction, WriteBatch};
use crate::validator;

/// Method tag recorded on every dividend distribution run.
pub const DISTRIBUTION_METHOD: &str = "SHARE_PERCENTAGE";

/// Cached balances versus a fresh projection of the transaction log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reconciliation {
    pub cached: Balances,
    pub projected: Balances,
}

impl Reconciliation {
    /// True when the materialized view has not drifted from the log.
    pub fn is_consistent(&self) -> bool {
        self.cached == self.projected
    }
}

/// Ledger engine over a storage collaborator.
pub struct LedgerEngine<S: LedgerStore> {
    store: S,
    audit: Box<dyn AuditSink>,
    identity: Box<dyn IdentityProvider>,
}

impl LedgerEngine<crate::store::MemoryStore> {
    /// Engine backed by the in-memory development store.
    pub fn in_memory() -> Self {
        Self::new(crate::store::MemoryStore::new())
    }
}

impl<S: LedgerStore> LedgerEngine<S> {
    /// Create an engine with the default audit sink (structured logging)
    /// and system identity.
    pub fn new(store: S) -> Self {
        Self {
            store,
            audit: Box::new(TracingAuditSink),
            identity: Box::new(SystemIdentity),
        }
    }

    /// Replace the audit sink.
    pub fn with_audit(mut self, audit: impl AuditSink + 'static) -> Self {
        self.audit = Box::new(audit);
        self
    }

    /// Replace the identity provider.
    pub fn with_identity(mut self, identity: impl IdentityProvider + 'static) -> Self {
        self.identity = Box::new(identity);
        self
    }

    /// Read-only access to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Register a member with zero balances.
    pub fn register_member(&mut self, member: NewMember) -> Result<Member> {
        let member = self.store.create_member(member)?;
        self.record_audit(
            "MEMBER_REGISTERED",
            "Member",
            member.id.to_string(),
            json!({ "accountNumber": member.account_number }),
        );
        Ok(member)
    }

    pub fn member(&self, id: MemberId) -> Result<Member> {
        self.store
            .find_member(id)
            .ok_or(LedgerError::MemberNotFound(id))
    }

    /// Validate and commit one transaction: insert the ledger entry and
    /// update the owner's cached balances as a single atomic unit. Nothing
    /// is persisted on rejection.
    pub fn commit_transaction(&mut self, request: TransactionRequest) -> Result<Transaction> {
        let member = self.member(request.member_id)?;

        let balances = member.balances();
        validator::validate(
            &balances,
            request.tx_type,
            request.amount,
            request.principal_amount,
        )?;

        let pending = PendingTransaction {
            member_id: request.member_id,
            tx_type: request.tx_type,
            amount: request.amount,
            principal_amount: request.principal_amount,
            interest_amount: request.interest_amount,
            date: request.date,
            description: request.description.unwrap_or_default(),
            receipt_number: request.receipt_number,
            is_reversal: false,
            original_transaction_id: None,
        };

        let tx = self.commit_pending(&member, pending, None)?;
        self.record_audit(
            "TRANSACTION_CREATED",
            "Transaction",
            tx.id.to_string(),
            json!({ "type": tx.tx_type, "amount": tx.amount, "memberId": tx.member_id }),
        );
        Ok(tx)
    }

    /// Synthesize and commit the counter-transaction that nets an existing
    /// transaction's effect back to zero. The original record keeps its
    /// monetary fields and gains a `reversed_by` stamp; history is never
    /// deleted, so one economic event ends up as two ledger entries.
    ///
    /// Reversals bypass the validator: they restore recorded history even
    /// when the current cached balance would reject the counter-movement.
    pub fn reverse_transaction(&mut self, id: TransactionId, reason: &str) -> Result<Transaction> {
        let original = self
            .store
            .find_transaction(id)
            .ok_or(LedgerError::TransactionNotFound(id))?;

        // A reversal record already offsets something; offsetting it again
        // would resurrect the original effect without an audit anchor.
        if original.is_reversal {
            return Err(LedgerError::UnsupportedReversalType(original.tx_type));
        }
        if original.reversed_by.is_some() {
            return Err(LedgerError::AlreadyReversed(id));
        }

        let counter = original
            .tx_type
            .counter_type()
            .ok_or(LedgerError::UnsupportedReversalType(original.tx_type))?;

        let member = self.member(original.member_id)?;

        // Choose the principal split so the reversal's projector delta is
        // the exact negation of the original's. Savings/share types are
        // symmetric in `amount`; loan types are not, because a disbursal
        // moves principal+interest while a repayment moves principal only.
        let original_delta = projector::delta_for(&original);
        let principal_amount = match counter {
            TransactionType::LoanRepayment => Some(original_delta.loans),
            TransactionType::LoanDisbursal => Some(-original_delta.loans),
            _ => None,
        };

        let pending = PendingTransaction {
            member_id: original.member_id,
            tx_type: counter,
            amount: original.amount,
            principal_amount,
            interest_amount: None,
            date: original.date,
            description: format!("Reversal of {}: {}", original.reference(), reason),
            receipt_number: None,
            is_reversal: true,
            original_transaction_id: Some(original.id),
        };

        let tx = self.commit_pending(&member, pending, None)?;
        self.record_audit(
            "TRANSACTION_REVERSED",
            "Transaction",
            original.id.to_string(),
            json!({ "reversalId": tx.id, "reason": reason }),
        );
        Ok(tx)
    }

    /// Correct the presentation fields of a committed transaction.
    pub fn edit_transaction(&mut self, id: TransactionId, edit: CosmeticEdit) -> Result<Transaction> {
        let tx = self.store.update_transaction_cosmetics(id, &edit)?;
        self.record_audit(
            "TRANSACTION_EDITED",
            "Transaction",
            id.to_string(),
            json!({ "date": edit.date, "description": edit.description }),
        );
        Ok(tx)
    }

    /// Recompute a member's balances from their transaction log.
    pub fn project_balances(&self, member_id: MemberId) -> Result<Balances> {
        self.member(member_id)?;
        Ok(projector::project(&self.store.member_transactions(member_id)))
    }

    /// Statement view: every transaction with the balances after it,
    /// in `(date, id)` order.
    pub fn project_timeline(&self, member_id: MemberId) -> Result<Vec<TimelineEntry>> {
        self.member(member_id)?;
        Ok(projector::project_timeline(
            &self.store.member_transactions(member_id),
        ))
    }

    /// Compare the cached balances against a fresh projection. Any drift
    /// means something wrote balances outside the engine.
    pub fn reconcile(&self, member_id: MemberId) -> Result<Reconciliation> {
        let member = self.member(member_id)?;
        Ok(Reconciliation {
            cached: member.balances(),
            projected: projector::project(&self.store.member_transactions(member_id)),
        })
    }

    /// Compute each member's pro-rata slice of a dividend pool without
    /// committing anything. Members with zero shares are excluded.
    pub fn preview_dividend(&self, total_amount: Decimal) -> Result<Vec<DividendAllocation>> {
        if total_amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }

        let holders: Vec<Member> = self
            .store
            .members()
            .into_iter()
            .filter(|m| m.total_shares > Decimal::ZERO)
            .collect();

        let total_shares: Decimal = holders.iter().map(|m| m.total_shares).sum();
        if total_shares.is_zero() {
            return Err(LedgerError::NoSharesToDistribute);
        }

        Ok(holders
            .into_iter()
            .map(|member| {
                let fraction = member.total_shares / total_shares;
                DividendAllocation {
                    member_id: member.id,
                    shares: member.total_shares,
                    share_percentage: round2(fraction * Decimal::ONE_HUNDRED),
                    dividend_amount: round2(total_amount * fraction),
                }
            })
            .collect())
    }

    /// Execute a dividend run: one DIVIDEND transaction per eligible member
    /// plus the summary record, committed as a single atomic batch. A
    /// failure anywhere leaves no partial distribution behind.
    pub fn execute_dividend(
        &mut self,
        total_amount: Decimal,
        year: i32,
    ) -> Result<DividendDistribution> {
        let allocations = self.preview_dividend(total_amount)?;
        let date = Utc::now().date_naive();

        let mut writes = Vec::new();
        for allocation in &allocations {
            if allocation.dividend_amount.is_zero() {
                continue;
            }
            let member = self.member(allocation.member_id)?;
            let expected = member.balances();
            let delta = projector::delta_parts(
                TransactionType::Dividend,
                allocation.dividend_amount,
                None,
                None,
            );
            writes.push(BalanceWrite {
                transaction: PendingTransaction {
                    member_id: member.id,
                    tx_type: TransactionType::Dividend,
                    amount: allocation.dividend_amount,
                    principal_amount: None,
                    interest_amount: None,
                    date,
                    description: format!("Dividend distribution for {year}"),
                    receipt_number: None,
                    is_reversal: false,
                    original_transaction_id: None,
                },
                expected,
                after: projector::apply(expected, delta),
            });
        }

        let total_members = writes.len() as u32;
        let batch = WriteBatch {
            writes,
            distribution: Some(NewDistribution {
                year,
                total_amount,
                total_members,
                distribution_method: DISTRIBUTION_METHOD.to_string(),
            }),
            loan_transition: None,
        };
        self.store.apply(batch)?;

        let record = self
            .store
            .distributions()
            .into_iter()
            .last()
            .ok_or_else(|| LedgerError::Storage(anyhow!("distribution record missing")))?;

        self.record_audit(
            "DIVIDEND_DISTRIBUTED",
            "DividendDistribution",
            record.id.to_string(),
            json!({ "year": year, "totalAmount": total_amount, "members": total_members }),
        );
        Ok(record)
    }

    /// File a loan request in `Pending` state.
    pub fn create_loan_request(&mut self, input: LoanRequestInput) -> Result<LoanRequest> {
        if input.amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        let request = self.store.create_loan_request(input)?;
        self.record_audit(
            "LOAN_REQUESTED",
            "LoanRequest",
            request.id.to_string(),
            json!({ "memberId": request.member_id, "amount": request.amount }),
        );
        Ok(request)
    }

    /// Disburse a pending loan request: commits the LOAN_DISBURSAL
    /// transaction and flips the request to `Disbursed` in one batch.
    pub fn disburse_loan(
        &mut self,
        request_id: LoanRequestId,
        date: NaiveDate,
        receipt_number: Option<String>,
    ) -> Result<Transaction> {
        let request = self
            .store
            .find_loan_request(request_id)
            .ok_or(LedgerError::LoanRequestNotFound(request_id))?;
        if request.status != LoanStatus::Pending {
            return Err(LedgerError::LoanRequestNotPending(request_id));
        }

        let member = self.member(request.member_id)?;

        let principal = request.amount;
        let interest = match request.interest_type {
            InterestType::Percentage => {
                round2(principal * request.interest_rate / Decimal::ONE_HUNDRED)
            }
            InterestType::Fixed => request.interest_amount,
        };

        let pending = PendingTransaction {
            member_id: member.id,
            tx_type: TransactionType::LoanDisbursal,
            amount: principal + interest,
            principal_amount: Some(principal),
            interest_amount: Some(interest),
            date,
            description: format!("Loan disbursal: {}", request.purpose),
            receipt_number,
            is_reversal: false,
            original_transaction_id: None,
        };

        let tx = self.commit_pending(
            &member,
            pending,
            Some((request_id, LoanStatus::Disbursed)),
        )?;
        self.record_audit(
            "LOAN_DISBURSED",
            "LoanRequest",
            request_id.to_string(),
            json!({ "transactionId": tx.id, "principal": principal, "interest": interest }),
        );
        Ok(tx)
    }

    /// Reject a pending loan request. Terminal.
    pub fn reject_loan(&mut self, request_id: LoanRequestId) -> Result<LoanRequest> {
        let request = self
            .store
            .find_loan_request(request_id)
            .ok_or(LedgerError::LoanRequestNotFound(request_id))?;
        if request.status != LoanStatus::Pending {
            return Err(LedgerError::LoanRequestNotPending(request_id));
        }

        let request = self.store.set_loan_status(request_id, LoanStatus::Rejected)?;
        self.record_audit(
            "LOAN_REJECTED",
            "LoanRequest",
            request_id.to_string(),
            json!({ "memberId": request.member_id }),
        );
        Ok(request)
    }

    /// Commit one pending transaction atomically with its balance update
    /// (and an optional loan-status flip).
    fn commit_pending(
        &mut self,
        member: &Member,
        pending: PendingTransaction,
        loan_transition: Option<(LoanRequestId, LoanStatus)>,
    ) -> Result<Transaction> {
        let expected = member.balances();
        let delta = projector::delta_parts(
            pending.tx_type,
            pending.amount,
            pending.principal_amount,
            pending.interest_amount,
        );

        let mut batch = WriteBatch::single(BalanceWrite {
            transaction: pending,
            expected,
            after: projector::apply(expected, delta),
        });
        batch.loan_transition = loan_transition;

        let mut inserted = self.store.apply(batch)?;
        let tx = inserted.pop().expect("apply returns one row per write");
        debug!(
            tx_id = tx.id,
            member_id = tx.member_id,
            tx_type = %tx.tx_type,
            amount = %tx.amount,
            "committed transaction"
        );
        Ok(tx)
    }

    /// Best-effort audit: failures are logged, never surfaced.
    fn record_audit(
        &self,
        action: &str,
        entity_type: &'static str,
        entity_id: String,
        details: serde_json::Value,
    ) {
        let entry = AuditEntry {
            action: action.to_string(),
            entity_type,
            entity_id,
            user_id: self.identity.current_user(),
            details,
            at: Utc::now(),
        };
        if let Err(err) = self.audit.record(entry) {
            warn!(action, error = %err, "audit sink failed; operation proceeds");
        }
    }
}

fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
