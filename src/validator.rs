//! Pre-commit validation of a proposed transaction against current balances.

use rust_decimal::Decimal;

use crate::error::{LedgerError, Result};
use crate::models::{Balances, TransactionType};

/// Check a proposed transaction before it is allowed to commit.
///
/// Rules are checked in order; the first failing rule wins:
/// 1. the amount must be positive
/// 2. savings withdrawals cannot exceed current savings
/// 3. share withdrawals cannot exceed current shares
/// 4. a repayment's principal cannot exceed the outstanding loan balance
///
/// No other type carries a pre-commit balance check. That is deliberate
/// policy, not an oversight: the fund can always accept money or extend
/// credit; it can only be prevented from paying out more than exists.
pub fn validate(
    balances: &Balances,
    tx_type: TransactionType,
    amount: Decimal,
    principal: Option<Decimal>,
) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount);
    }

    match tx_type {
        TransactionType::Withdrawal | TransactionType::SavingsWithdrawal => {
            if amount > balances.savings {
                return Err(LedgerError::InsufficientSavings {
                    available: balances.savings,
                    requested: amount,
                });
            }
        }
        TransactionType::ShareWithdrawal => {
            if amount > balances.shares {
                return Err(LedgerError::InsufficientShares {
                    held: balances.shares,
                    requested: amount,
                });
            }
        }
        TransactionType::LoanRepayment => {
            let principal = principal.unwrap_or(amount);
            if principal > balances.loans {
                return Err(LedgerError::PrincipalExceedsOutstanding {
                    principal,
                    outstanding: balances.loans,
                });
            }
        }
        _ => {}
    }

    Ok(())
}
