use crate::fx::fx_errors::FxError;
use crate::fx::fx_model::ExchangeRate;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// A calculator for currency conversions over historical rates, keyed by
/// the latest observed rate per day for each pair.
///
/// When a direct `A->B` rate is loaded for a date, the reciprocal
/// `B->A = 1/rate` is materialized alongside it. A pair with neither
/// direction observed stays missing; no cross rates are synthesized.
pub struct CurrencyConverter {
    // Date -> (From, To) -> Rate
    historical_rates: HashMap<NaiveDate, HashMap<(String, String), Decimal>>,
    sorted_dates: Vec<NaiveDate>,
}

impl CurrencyConverter {
    pub fn new(exchange_rates: Vec<ExchangeRate>) -> Result<Self, FxError> {
        let mut converter = CurrencyConverter {
            historical_rates: HashMap::new(),
            sorted_dates: Vec::new(),
        };
        converter.add_historical_rates(exchange_rates)?;
        Ok(converter)
    }

    /// Adds historical FX rates, materializing inverses.
    /// For each day, only the latest observation for a pair is kept.
    fn add_historical_rates(&mut self, rates: Vec<ExchangeRate>) -> Result<(), FxError> {
        let mut latest_rates_by_date: HashMap<NaiveDate, HashMap<(String, String), ExchangeRate>> =
            HashMap::new();

        for rate in rates {
            // Ignore self-referential rates
            if rate.from_currency == rate.to_currency {
                continue;
            }

            let date = rate.timestamp.date_naive();
            let pair = (rate.from_currency.clone(), rate.to_currency.clone());

            let date_map = latest_rates_by_date.entry(date).or_default();
            match date_map.entry(pair) {
                std::collections::hash_map::Entry::Occupied(mut entry) => {
                    if rate.timestamp > entry.get().timestamp {
                        *entry.get_mut() = rate;
                    }
                }
                std::collections::hash_map::Entry::Vacant(entry) => {
                    entry.insert(rate);
                }
            }
        }

        self.historical_rates.clear();
        self.sorted_dates.clear();

        for (date, chosen_rates_for_date) in latest_rates_by_date {
            let mut rate_map: HashMap<(String, String), Decimal> = HashMap::new();

            for (_pair, rate) in chosen_rates_for_date {
                let forward_rate = rate.rate;
                rate_map.insert(
                    (rate.from_currency.clone(), rate.to_currency.clone()),
                    forward_rate,
                );

                if forward_rate.is_zero() {
                    log::error!(
                        "Zero exchange rate for {}/{} on {}. Cannot materialize inverse.",
                        rate.from_currency,
                        rate.to_currency,
                        date
                    );
                    continue;
                }
                rate_map.insert(
                    (rate.to_currency.clone(), rate.from_currency.clone()),
                    Decimal::ONE / forward_rate,
                );
            }

            self.historical_rates.insert(date, rate_map);
            if !self.sorted_dates.contains(&date) {
                self.sorted_dates.push(date);
                self.sorted_dates.sort();
            }
        }
        Ok(())
    }

    /// Gets the exchange rate between two currencies on a specific date.
    pub fn get_rate(
        &self,
        from_currency: &str,
        to_currency: &str,
        date: NaiveDate,
    ) -> Result<Decimal, FxError> {
        if from_currency == to_currency {
            return Ok(Decimal::ONE);
        }

        self.historical_rates
            .get(&date)
            .and_then(|rate_map| {
                rate_map.get(&(from_currency.to_string(), to_currency.to_string()))
            })
            .copied()
            .ok_or_else(|| FxError::rate_not_found(from_currency, to_currency, date))
    }

    /// Gets the most recent exchange rate on or before the given date.
    /// A rate observed after the requested date is never used.
    pub fn get_rate_on_or_before(
        &self,
        from_currency: &str,
        to_currency: &str,
        date: NaiveDate,
    ) -> Result<Decimal, FxError> {
        if from_currency == to_currency {
            return Ok(Decimal::ONE);
        }

        // Index of the first date strictly after the requested one
        let upper = match self.sorted_dates.binary_search(&date) {
            Ok(index) => index + 1,
            Err(index) => index,
        };

        let pair = (from_currency.to_string(), to_currency.to_string());
        for candidate_date in self.sorted_dates[..upper].iter().rev() {
            if let Some(rate) = self
                .historical_rates
                .get(candidate_date)
                .and_then(|rate_map| rate_map.get(&pair))
            {
                return Ok(*rate);
            }
        }

        Err(FxError::rate_not_found(from_currency, to_currency, date))
    }

    /// Converts an amount using the most recent rate on or before `date`.
    pub fn convert_amount_on_or_before(
        &self,
        amount: Decimal,
        from_currency: &str,
        to_currency: &str,
        date: NaiveDate,
    ) -> Result<Decimal, FxError> {
        if from_currency == to_currency {
            return Ok(amount);
        }

        let rate = self.get_rate_on_or_before(from_currency, to_currency, date)?;
        Ok(amount * rate)
    }
}
