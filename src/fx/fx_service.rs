use super::currency_converter::CurrencyConverter;
use super::fx_errors::FxError;
use super::fx_traits::{FxRepositoryTrait, FxServiceTrait};
use crate::errors::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::{Arc, RwLock};

/// Resolves exchange rates for the valuation mapper, backed by a
/// converter built once from the repository's full rate history.
#[derive(Clone)]
pub struct FxService {
    repository: Arc<dyn FxRepositoryTrait>,
    converter: Arc<RwLock<Option<CurrencyConverter>>>,
}

impl FxService {
    pub fn new(repository: Arc<dyn FxRepositoryTrait>) -> Self {
        Self {
            repository,
            converter: Arc::new(RwLock::new(None)),
        }
    }

    fn initialize_converter(&self) -> Result<()> {
        let all_historical_rates = self.repository.get_historical_exchange_rates()?;

        if all_historical_rates.is_empty() {
            log::warn!("No exchange rates available, converter not initialized");
            let mut converter_lock = self
                .converter
                .write()
                .map_err(|e| FxError::CacheError(e.to_string()))?;
            *converter_lock = None;
            return Ok(());
        }

        let converter = CurrencyConverter::new(all_historical_rates)?;
        let mut converter_lock = self
            .converter
            .write()
            .map_err(|e| FxError::CacheError(e.to_string()))?;
        *converter_lock = Some(converter);
        Ok(())
    }
}

impl FxServiceTrait for FxService {
    fn initialize(&self) -> Result<()> {
        self.initialize_converter()
    }

    fn get_exchange_rate_for_date(
        &self,
        from_currency: &str,
        to_currency: &str,
        date: NaiveDate,
    ) -> Result<Decimal> {
        // Same-currency conversions never touch the rate table
        if from_currency == to_currency {
            return Ok(Decimal::ONE);
        }

        let converter_lock = self
            .converter
            .read()
            .map_err(|e| FxError::CacheError(e.to_string()))?;

        match converter_lock.as_ref() {
            Some(converter) => Ok(converter.get_rate_on_or_before(
                from_currency,
                to_currency,
                date,
            )?),
            None => Err(FxError::rate_not_found(from_currency, to_currency, date).into()),
        }
    }

    fn convert_currency_for_date(
        &self,
        amount: Decimal,
        from_currency: &str,
        to_currency: &str,
        date: NaiveDate,
    ) -> Result<Decimal> {
        if from_currency == to_currency {
            return Ok(amount);
        }

        let rate = self.get_exchange_rate_for_date(from_currency, to_currency, date)?;
        Ok(amount * rate)
    }
}
