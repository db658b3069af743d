use crate::errors::{MarketDataError, Result};
use crate::fx::FxServiceTrait;
use crate::market_data::MarketDataRepositoryTrait;
use crate::portfolio::holdings::{Holding, InstrumentType, MonetaryValue, ValuedHolding};
use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;
use std::sync::Arc;

pub trait HoldingsValuationServiceTrait: Send + Sync {
    /// Values each holding as of `as_of_date` in `base_currency`.
    ///
    /// Fails on the first missing price or FX rate; no partial holding
    /// values are returned.
    fn value_holdings(
        &self,
        holdings: &[Holding],
        base_currency: &str,
        as_of_date: NaiveDate,
    ) -> Result<Vec<ValuedHolding>>;
}

/// Total account value = sum of base-currency market values.
pub fn total_base_value(holdings: &[ValuedHolding]) -> Decimal {
    holdings.iter().map(|h| h.market_value.base).sum()
}

#[derive(Clone)]
pub struct HoldingsValuationService {
    fx_service: Arc<dyn FxServiceTrait>,
    market_data_repository: Arc<dyn MarketDataRepositoryTrait>,
}

impl HoldingsValuationService {
    pub fn new(
        fx_service: Arc<dyn FxServiceTrait>,
        market_data_repository: Arc<dyn MarketDataRepositoryTrait>,
    ) -> Self {
        Self {
            fx_service,
            market_data_repository,
        }
    }

    /// Resolves the local-currency unit price for a holding.
    /// Cash is always worth exactly one unit of its own currency.
    fn resolve_price(&self, holding: &Holding, as_of_date: NaiveDate) -> Result<Decimal> {
        match holding.instrument.instrument_type {
            InstrumentType::Cash => Ok(Decimal::ONE),
            InstrumentType::Security => {
                let symbol = &holding.instrument.symbol;
                let quote = self
                    .market_data_repository
                    .get_quote_on_or_before(symbol, as_of_date)?
                    .ok_or_else(|| MarketDataError::PriceNotFound {
                        symbol: symbol.clone(),
                        date: as_of_date,
                    })?;

                if quote.currency != holding.local_currency {
                    warn!(
                        "Holding {}: quote currency ({}) differs from holding currency ({}). Using quote price as-is.",
                        symbol, quote.currency, holding.local_currency
                    );
                }

                Ok(quote.close)
            }
        }
    }
}

impl HoldingsValuationServiceTrait for HoldingsValuationService {
    fn value_holdings(
        &self,
        holdings: &[Holding],
        base_currency: &str,
        as_of_date: NaiveDate,
    ) -> Result<Vec<ValuedHolding>> {
        if holdings.is_empty() {
            return Ok(Vec::new());
        }
        debug!(
            "Valuing {} holdings in {} as of {}",
            holdings.len(),
            base_currency,
            as_of_date
        );

        let mut valued = Vec::with_capacity(holdings.len());
        for holding in holdings {
            let price = self.resolve_price(holding, as_of_date)?;
            let fx_rate = self.fx_service.get_exchange_rate_for_date(
                &holding.local_currency,
                base_currency,
                as_of_date,
            )?;

            let local_value = holding.units * price;
            valued.push(ValuedHolding {
                account_id: holding.account_id.clone(),
                instrument: holding.instrument.clone(),
                units: holding.units,
                local_currency: holding.local_currency.clone(),
                base_currency: base_currency.to_string(),
                price,
                fx_rate,
                market_value: MonetaryValue {
                    local: local_value,
                    base: local_value * fx_rate,
                },
                as_of_date,
            });
        }

        Ok(valued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use crate::fx::{ExchangeRate, FxRepositoryTrait, FxService};
    use crate::market_data::Quote;
    use crate::portfolio::holdings::Instrument;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    struct StaticFxRepository {
        rates: Vec<ExchangeRate>,
    }

    impl FxRepositoryTrait for StaticFxRepository {
        fn get_historical_exchange_rates(&self) -> Result<Vec<ExchangeRate>> {
            Ok(self.rates.clone())
        }
    }

    struct StaticQuoteRepository {
        quotes: Vec<Quote>,
    }

    impl MarketDataRepositoryTrait for StaticQuoteRepository {
        fn get_quote_on_or_before(&self, symbol: &str, date: NaiveDate) -> Result<Option<Quote>> {
            Ok(self
                .quotes
                .iter()
                .filter(|q| q.symbol == symbol && q.date <= date)
                .max_by_key(|q| q.date)
                .cloned())
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn holding(symbol: &str, kind: InstrumentType, units: Decimal, currency: &str) -> Holding {
        Holding {
            account_id: "acct-1".to_string(),
            instrument: Instrument {
                symbol: symbol.to_string(),
                name: None,
                instrument_type: kind,
            },
            units,
            local_currency: currency.to_string(),
            as_of_date: date(2024, 6, 28),
        }
    }

    fn service(rates: Vec<ExchangeRate>, quotes: Vec<Quote>) -> HoldingsValuationService {
        let fx = FxService::new(Arc::new(StaticFxRepository { rates }));
        fx.initialize().unwrap();
        HoldingsValuationService::new(Arc::new(fx), Arc::new(StaticQuoteRepository { quotes }))
    }

    #[test]
    fn test_values_security_and_cash_in_base_currency() {
        let ts = Utc.with_ymd_and_hms(2024, 6, 27, 16, 0, 0).unwrap();
        let service = service(
            vec![ExchangeRate::new("USD", "GBP", dec!(0.8), ts)],
            vec![Quote {
                symbol: "AAPL".to_string(),
                date: date(2024, 6, 27),
                close: dec!(200),
                currency: "USD".to_string(),
            }],
        );

        let holdings = vec![
            holding("AAPL", InstrumentType::Security, dec!(10), "USD"),
            holding("$CASH-GBP", InstrumentType::Cash, dec!(500), "GBP"),
        ];

        let valued = service
            .value_holdings(&holdings, "GBP", date(2024, 6, 28))
            .unwrap();

        // 10 units * 200 USD * 0.8 = 1600 GBP
        assert_eq!(valued[0].market_value.local, dec!(2000));
        assert_eq!(valued[0].market_value.base, dec!(1600.0));
        assert_eq!(valued[0].fx_rate, dec!(0.8));

        // Cash in base currency: price 1, fx 1
        assert_eq!(valued[1].price, Decimal::ONE);
        assert_eq!(valued[1].fx_rate, Decimal::ONE);
        assert_eq!(valued[1].market_value.base, dec!(500));

        assert_eq!(total_base_value(&valued), dec!(2100.0));
    }

    #[test]
    fn test_missing_price_names_instrument_and_date() {
        let service = service(Vec::new(), Vec::new());
        let holdings = vec![holding("MSFT", InstrumentType::Security, dec!(5), "USD")];

        let err = service
            .value_holdings(&holdings, "USD", date(2024, 6, 28))
            .unwrap_err();
        match err {
            Error::MarketData(MarketDataError::PriceNotFound { symbol, date: d }) => {
                assert_eq!(symbol, "MSFT");
                assert_eq!(d, date(2024, 6, 28));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_fx_rate_fails_whole_valuation() {
        let service = service(
            Vec::new(),
            vec![Quote {
                symbol: "AAPL".to_string(),
                date: date(2024, 6, 27),
                close: dec!(200),
                currency: "USD".to_string(),
            }],
        );

        // USD->GBP has no modeled rate in either direction
        let holdings = vec![
            holding("AAPL", InstrumentType::Security, dec!(10), "USD"),
            holding("$CASH-GBP", InstrumentType::Cash, dec!(500), "GBP"),
        ];

        let err = service
            .value_holdings(&holdings, "GBP", date(2024, 6, 28))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("USD/GBP"));
        assert!(message.contains("2024-06-28"));
    }
}
