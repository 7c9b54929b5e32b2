//! Balance projection: folding the transaction log into running balances.
//!
//! Everything here is pure. The projector never fails, never clamps and
//! never touches storage; clamping (if any) is a policy decision of the
//! validator or the display layer.

use rust_decimal::Decimal;

use crate::models::{Balances, Transaction, TransactionType};

/// Signed effect of one transaction on the three balances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BalanceDelta {
    pub savings: Decimal,
    pub shares: Decimal,
    pub loans: Decimal,
}

impl BalanceDelta {
    /// The delta that exactly undoes this one.
    pub fn negated(self) -> BalanceDelta {
        BalanceDelta {
            savings: -self.savings,
            shares: -self.shares,
            loans: -self.loans,
        }
    }
}

/// One statement line: a transaction and the balances after applying it.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub transaction: Transaction,
    pub running: Balances,
}

/// Fixed per-type delta rule.
///
/// Loan movements follow the principal/interest split: a disbursal grows the
/// loans balance by principal plus interest, a repayment shrinks it by the
/// principal only. A missing principal defaults to the full amount, missing
/// interest to zero. Fines have no balance effect.
pub fn delta_parts(
    tx_type: TransactionType,
    amount: Decimal,
    principal: Option<Decimal>,
    interest: Option<Decimal>,
) -> BalanceDelta {
    let mut delta = BalanceDelta::default();
    match tx_type {
        TransactionType::Deposit | TransactionType::SavingsDeposit | TransactionType::Dividend => {
            delta.savings = amount;
        }
        TransactionType::Withdrawal | TransactionType::SavingsWithdrawal => {
            delta.savings = -amount;
        }
        TransactionType::SharePurchase => {
            delta.shares = amount;
        }
        TransactionType::ShareWithdrawal => {
            delta.shares = -amount;
        }
        TransactionType::LoanDisbursal => {
            delta.loans = principal.unwrap_or(amount) + interest.unwrap_or(Decimal::ZERO);
        }
        TransactionType::LoanRepayment => {
            delta.loans = -principal.unwrap_or(amount);
        }
        // Fines are income-side only; they never move a member balance.
        TransactionType::LoanFine => {}
    }
    delta
}

/// Delta of a committed transaction.
pub fn delta_for(tx: &Transaction) -> BalanceDelta {
    delta_parts(tx.tx_type, tx.amount, tx.principal_amount, tx.interest_amount)
}

/// Apply a delta to a balance snapshot.
pub fn apply(balances: Balances, delta: BalanceDelta) -> Balances {
    Balances {
        savings: balances.savings + delta.savings,
        shares: balances.shares + delta.shares,
        loans: balances.loans + delta.loans,
    }
}

/// Fold a transaction log into final balances.
///
/// Input order does not matter: transactions are ordered by `(date, id)`
/// before folding, which makes the projection deterministic for any
/// permutation of the same records.
pub fn project(transactions: &[Transaction]) -> Balances {
    let mut ordered: Vec<&Transaction> = transactions.iter().collect();
    ordered.sort_by_key(|tx| (tx.date, tx.id));

    ordered.into_iter().fold(Balances::ZERO, |balances, tx| {
        apply(balances, delta_for(tx))
    })
}

/// Fold a transaction log into a per-transaction running snapshot, in
/// `(date, id)` order. Used for statement display.
pub fn project_timeline(transactions: &[Transaction]) -> Vec<TimelineEntry> {
    let mut ordered: Vec<Transaction> = transactions.to_vec();
    ordered.sort_by_key(|tx| (tx.date, tx.id));

    let mut running = Balances::ZERO;
    ordered
        .into_iter()
        .map(|tx| {
            running = apply(running, delta_for(&tx));
            TimelineEntry {
                transaction: tx,
                running,
            }
        })
        .collect()
}
