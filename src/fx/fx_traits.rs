use super::fx_model::ExchangeRate;
use crate::errors::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Contract for the external FX-rate collaborator. Rates are fetched
/// once up front; the engine never calls out mid-calculation.
pub trait FxRepositoryTrait: Send + Sync {
    fn get_historical_exchange_rates(&self) -> Result<Vec<ExchangeRate>>;
}

/// Contract for FX resolution inside the engine.
pub trait FxServiceTrait: Send + Sync {
    fn initialize(&self) -> Result<()>;

    fn get_exchange_rate_for_date(
        &self,
        from_currency: &str,
        to_currency: &str,
        date: NaiveDate,
    ) -> Result<Decimal>;

    fn convert_currency_for_date(
        &self,
        amount: Decimal,
        from_currency: &str,
        to_currency: &str,
        date: NaiveDate,
    ) -> Result<Decimal>;
}
