use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::member::MemberId;

/// One member's slice of a proposed dividend pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendAllocation {
    pub member_id: MemberId,
    pub shares: Decimal,
    /// Share of the pool in percent, rounded to 2 decimal places for display.
    pub share_percentage: Decimal,
    /// Pro-rata payout, rounded to 2 decimal places.
    pub dividend_amount: Decimal,
}

/// Immutable record of one executed payout run; the authoritative list of
/// dividends already paid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DividendDistribution {
    pub id: u64,
    pub year: i32,
    pub total_amount: Decimal,
    pub total_members: u32,
    pub distribution_method: String,
    pub executed_at: DateTime<Utc>,
}
