//! Shared, serializing handle for concurrent request handlers.
//!
//! The web tier handles each request independently; two admins posting
//! transactions for the same member must not lose each other's balance
//! update. `SharedLedger` routes every mutation through one async
//! `RwLock`, so writers are serialized while projections and previews
//! run concurrently under the read lock.
//!
//! Unlike a per-member shard map, a single lock also covers dividend
//! execution, which writes across every shareholder in one batch.

use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::RwLock;

use crate::engine::{LedgerEngine, Reconciliation};
use crate::error::Result;
use crate::models::{
    Balances, DividendAllocation, DividendDistribution, LoanRequest, LoanRequestId,
    LoanRequestInput, Member, MemberId, NewMember, Transaction, TransactionId, TransactionRequest,
};
use crate::projector::TimelineEntry;
use crate::store::LedgerStore;

/// Cloneable handle to a ledger engine shared across tasks.
pub struct SharedLedger<S: LedgerStore> {
    inner: Arc<RwLock<LedgerEngine<S>>>,
}

impl<S: LedgerStore + Send + Sync> SharedLedger<S> {
    pub fn new(engine: LedgerEngine<S>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    /// Cheap clone of the handle (shares the same engine).
    pub fn clone_handle(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }

    pub async fn register_member(&self, member: NewMember) -> Result<Member> {
        self.inner.write().await.register_member(member)
    }

    pub async fn member(&self, id: MemberId) -> Result<Member> {
        self.inner.read().await.member(id)
    }

    pub async fn commit_transaction(&self, request: TransactionRequest) -> Result<Transaction> {
        self.inner.write().await.commit_transaction(request)
    }

    pub async fn reverse_transaction(
        &self,
        id: TransactionId,
        reason: &str,
    ) -> Result<Transaction> {
        self.inner.write().await.reverse_transaction(id, reason)
    }

    pub async fn project_balances(&self, member_id: MemberId) -> Result<Balances> {
        self.inner.read().await.project_balances(member_id)
    }

    pub async fn project_timeline(&self, member_id: MemberId) -> Result<Vec<TimelineEntry>> {
        self.inner.read().await.project_timeline(member_id)
    }

    pub async fn reconcile(&self, member_id: MemberId) -> Result<Reconciliation> {
        self.inner.read().await.reconcile(member_id)
    }

    pub async fn preview_dividend(&self, total_amount: Decimal) -> Result<Vec<DividendAllocation>> {
        self.inner.read().await.preview_dividend(total_amount)
    }

    pub async fn execute_dividend(
        &self,
        total_amount: Decimal,
        year: i32,
    ) -> Result<DividendDistribution> {
        self.inner.write().await.execute_dividend(total_amount, year)
    }

    pub async fn create_loan_request(&self, input: LoanRequestInput) -> Result<LoanRequest> {
        self.inner.write().await.create_loan_request(input)
    }

    pub async fn disburse_loan(
        &self,
        request_id: LoanRequestId,
        date: chrono::NaiveDate,
        receipt_number: Option<String>,
    ) -> Result<Transaction> {
        self.inner
            .write()
            .await
            .disburse_loan(request_id, date, receipt_number)
    }

    pub async fn reject_loan(&self, request_id: LoanRequestId) -> Result<LoanRequest> {
        self.inner.write().await.reject_loan(request_id)
    }
}
