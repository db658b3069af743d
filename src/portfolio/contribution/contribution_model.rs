use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Per-instrument slice of the portfolio return between two valuation
/// dates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContributionData {
    pub symbol: String,
    /// Start-of-period base value / total start value.
    pub weight: Decimal,
    pub instrument_return: Decimal,
    /// `weight * instrument_return`.
    pub contribution: Decimal,
    pub start_value_base: Decimal,
    pub end_value_base: Decimal,
    /// End value minus start value, in base currency.
    pub absolute_contribution: Decimal,
    /// Share of the total portfolio absolute return; 0 when the total
    /// absolute return is zero.
    pub percentage_contribution: Decimal,
}

/// Immutable result of one contribution decomposition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionSummary {
    pub account_id: String,
    pub period_start_date: NaiveDate,
    pub period_end_date: NaiveDate,
    pub base_currency: String,
    pub total_start_value: Decimal,
    pub total_end_value: Decimal,
    pub portfolio_return: Decimal,
    pub total_absolute_return: Decimal,
    /// Sorted descending by contribution.
    pub entries: Vec<ContributionData>,
    pub top_contributor: Option<String>,
    pub worst_contributor: Option<String>,
}
