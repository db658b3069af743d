use super::market_data_model::Quote;
use crate::errors::Result;
use chrono::NaiveDate;

/// Contract for the external price collaborator.
///
/// `Ok(None)` means no quote exists on or before the date; the valuation
/// mapper turns that into a data-insufficiency error naming the
/// instrument and date.
pub trait MarketDataRepositoryTrait: Send + Sync {
    fn get_quote_on_or_before(&self, symbol: &str, date: NaiveDate) -> Result<Option<Quote>>;
}
