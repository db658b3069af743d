use super::holdings_model::Holding;
use crate::errors::Result;
use crate::models::DateRange;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An external cash movement into (positive) or out of (negative) an
/// account. Internal flows such as reinvested dividends are not
/// represented here and never break a TWR sub-period.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CashFlow {
    pub date: NaiveDate,
    pub amount: Decimal,
}

/// Contract for the external holdings collaborator. All data is
/// point-in-time and pre-resolved; the engine performs no I/O of its own.
pub trait HoldingsRepositoryTrait: Send + Sync {
    /// Holdings snapshot as of `date`. An empty list is a valid answer;
    /// a missing account is the collaborator's precondition failure.
    fn get_holdings(&self, account_id: &str, date: NaiveDate) -> Result<Vec<Holding>>;

    /// Ordered dates within the range for which holding snapshots exist.
    fn get_holding_dates_in_range(
        &self,
        account_id: &str,
        range: &DateRange,
    ) -> Result<Vec<NaiveDate>>;

    /// External deposits/withdrawals within the range, ordered by date.
    fn get_external_cash_flows(
        &self,
        account_id: &str,
        range: &DateRange,
    ) -> Result<Vec<CashFlow>>;
}
