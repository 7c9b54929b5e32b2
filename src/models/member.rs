use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Member identifier, assigned monotonically by the store.
pub type MemberId = u64;

/// A registered participant holding three sub-accounts: savings, shares
/// and loans.
///
/// The `total_*` fields are a materialized view of the member's transaction
/// log. The store's atomic write path is the only code allowed to touch
/// them, and they must always equal what the balance projector computes
/// from the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    /// Unique, immutable; doubles as the login identity upstream.
    pub account_number: String,
    pub name: String,
    pub total_savings: Decimal,
    pub total_shares: Decimal,
    pub total_loans: Decimal,
}

impl Member {
    /// Current cached balances as one value, for validation and projection
    /// comparisons.
    pub fn balances(&self) -> Balances {
        Balances {
            savings: self.total_savings,
            shares: self.total_shares,
            loans: self.total_loans,
        }
    }
}

/// Profile data for registering a new member. Balances start at zero.
#[derive(Debug, Clone)]
pub struct NewMember {
    pub account_number: String,
    pub name: String,
}

/// The three running balances of one member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balances {
    pub savings: Decimal,
    pub shares: Decimal,
    pub loans: Decimal,
}

impl Balances {
    pub const ZERO: Balances = Balances {
        savings: Decimal::ZERO,
        shares: Decimal::ZERO,
        loans: Decimal::ZERO,
    };
}

impl Default for Balances {
    fn default() -> Self {
        Self::ZERO
    }
}
