use crate::constants::{DAYS_PER_YEAR, DECIMAL_PRECISION, MIN_DAYS_FOR_MEANINGFUL_ANNUALIZATION};
use crate::errors::{CalculatorError, Result};
use crate::models::DateRange;
use crate::portfolio::holdings::{
    total_base_value, HoldingsRepositoryTrait, HoldingsValuationServiceTrait,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{PerformanceMetrics, ReturnData, SubPeriod, ValuationPoint};

#[async_trait]
pub trait PerformanceServiceTrait: Send + Sync {
    /// Computes the time-weighted return of an account over a date range,
    /// breaking a sub-period at every external cash-flow date.
    async fn calculate_twr(
        &self,
        account_id: &str,
        range: &DateRange,
    ) -> Result<PerformanceMetrics>;
}

pub struct PerformanceService {
    holdings_repository: Arc<dyn HoldingsRepositoryTrait>,
    valuation_service: Arc<dyn HoldingsValuationServiceTrait>,
    base_currency: String,
}

impl PerformanceService {
    pub fn new(
        holdings_repository: Arc<dyn HoldingsRepositoryTrait>,
        valuation_service: Arc<dyn HoldingsValuationServiceTrait>,
        base_currency: impl Into<String>,
    ) -> Self {
        Self {
            holdings_repository,
            valuation_service,
            base_currency: base_currency.into(),
        }
    }

    /// Builds flow-bounded sub-periods from an ordered sequence of
    /// boundary valuations. A boundary whose value cannot seed a return
    /// (start value <= 0) is skipped with a warning; the caller decides
    /// whether an empty result is an error.
    pub fn build_sub_periods(points: &[ValuationPoint]) -> Vec<(NaiveDate, SubPeriod)> {
        let mut sub_periods = Vec::with_capacity(points.len().saturating_sub(1));
        for window in points.windows(2) {
            let prev = &window[0];
            let curr = &window[1];
            match SubPeriod::new(prev.total_value, curr.total_value, curr.net_flow) {
                Ok(period) => sub_periods.push((curr.date, period)),
                Err(e) => {
                    warn!(
                        "Skipping sub-period ending {}: {}",
                        curr.date, e
                    );
                }
            }
        }
        sub_periods
    }

    /// Geometric chain: `TWR = prod(1 + r_i) - 1`, evaluated in
    /// chronological order. Compounding over differing flows is not
    /// commutative, so the input order is load-bearing.
    pub fn link_sub_periods(sub_periods: &[SubPeriod]) -> Decimal {
        let mut cumulative = Decimal::ONE;
        for period in sub_periods {
            cumulative *= Decimal::ONE + period.period_return();
        }
        cumulative - Decimal::ONE
    }

    /// `(1 + total_return)^(365/days) - 1` with `days` the inclusive day
    /// count of the requested range. Exact passthrough for a 365-day
    /// range. Figures for ranges under ~30 days are informational only;
    /// the exponent amplifies short-range noise.
    pub fn calculate_annualized_return(days: i64, total_return: Decimal) -> Decimal {
        // A total loss (or worse) cannot be exponentiated; cap at -100%.
        if total_return <= dec!(-1.0) {
            return dec!(-1.0);
        }
        if days <= 0 {
            return total_return;
        }
        if days < MIN_DAYS_FOR_MEANINGFUL_ANNUALIZATION {
            debug!(
                "Annualizing over {} days (< {}); figure is informational only",
                days, MIN_DAYS_FOR_MEANINGFUL_ANNUALIZATION
            );
        }

        let exponent = Decimal::from(DAYS_PER_YEAR) / Decimal::from(days);
        if exponent == Decimal::ONE {
            return total_return;
        }

        let base = Decimal::ONE + total_return;
        base.powd(exponent) - Decimal::ONE
    }

    async fn valuation_points(
        &self,
        account_id: &str,
        range: &DateRange,
    ) -> Result<(Vec<ValuationPoint>, Decimal)> {
        let flows = self
            .holdings_repository
            .get_external_cash_flows(account_id, range)?;

        // One boundary per flow date; a flow on the range start is part
        // of the opening value and breaks nothing.
        let mut flow_by_date: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
        for flow in &flows {
            if flow.date <= range.start() || flow.date > range.end() {
                continue;
            }
            *flow_by_date.entry(flow.date).or_insert(Decimal::ZERO) += flow.amount;
        }

        let mut boundary_dates: Vec<NaiveDate> = Vec::with_capacity(flow_by_date.len() + 2);
        boundary_dates.push(range.start());
        boundary_dates.extend(flow_by_date.keys().copied().filter(|d| *d < range.end()));
        boundary_dates.push(range.end());

        let mut points = Vec::with_capacity(boundary_dates.len());
        for date in boundary_dates {
            let holdings = self.holdings_repository.get_holdings(account_id, date)?;
            let valued =
                self.valuation_service
                    .value_holdings(&holdings, &self.base_currency, date)?;
            points.push(ValuationPoint {
                date,
                total_value: total_base_value(&valued),
                net_flow: flow_by_date.get(&date).copied().unwrap_or(Decimal::ZERO),
            });
        }

        let net_cash_flow: Decimal = flow_by_date.values().copied().sum();
        Ok((points, net_cash_flow))
    }
}

#[async_trait]
impl PerformanceServiceTrait for PerformanceService {
    async fn calculate_twr(
        &self,
        account_id: &str,
        range: &DateRange,
    ) -> Result<PerformanceMetrics> {
        let holding_dates = self
            .holdings_repository
            .get_holding_dates_in_range(account_id, range)?;
        if holding_dates.is_empty() {
            return Err(CalculatorError::InsufficientHoldingsData {
                account_id: account_id.to_string(),
                start: range.start(),
                end: range.end(),
            }
            .into());
        }

        let (points, net_cash_flow) = self.valuation_points(account_id, range).await?;
        debug!(
            "Account '{}': {} valuation boundaries between {} and {}",
            account_id,
            points.len(),
            range.start(),
            range.end()
        );

        let sub_periods = Self::build_sub_periods(&points);
        if sub_periods.is_empty() {
            return Err(CalculatorError::NoValidSubPeriods(format!(
                "account '{}' between {} and {}",
                account_id,
                range.start(),
                range.end()
            ))
            .into());
        }

        let mut returns = Vec::with_capacity(sub_periods.len() + 1);
        returns.push(ReturnData {
            date: points[0].date,
            value: Decimal::ZERO,
        });
        let mut sub_period_returns = Vec::with_capacity(sub_periods.len());

        let mut cumulative = Decimal::ONE;
        for (end_date, period) in &sub_periods {
            let period_return = period.period_return();
            sub_period_returns.push(ReturnData {
                date: *end_date,
                value: period_return.round_dp(DECIMAL_PRECISION),
            });
            cumulative *= Decimal::ONE + period_return;
            returns.push(ReturnData {
                date: *end_date,
                value: (cumulative - Decimal::ONE).round_dp(DECIMAL_PRECISION),
            });
        }
        let cumulative_twr = cumulative - Decimal::ONE;
        let annualized_twr = Self::calculate_annualized_return(range.days(), cumulative_twr);

        let start_value = points[0].total_value;
        let end_value = points[points.len() - 1].total_value;
        let gain_loss_amount = end_value - start_value - net_cash_flow;

        let simple_return = if start_value.is_zero() {
            if !gain_loss_amount.is_zero() {
                warn!(
                    "Account '{}': zero start value with non-zero gain; reporting simple return as 0",
                    account_id
                );
            }
            Decimal::ZERO
        } else {
            gain_loss_amount / start_value
        };
        let annualized_simple_return =
            Self::calculate_annualized_return(range.days(), simple_return);

        Ok(PerformanceMetrics {
            account_id: account_id.to_string(),
            period_start_date: range.start(),
            period_end_date: range.end(),
            base_currency: self.base_currency.clone(),
            returns,
            sub_period_returns,
            cumulative_twr: cumulative_twr.round_dp(DECIMAL_PRECISION),
            annualized_twr: annualized_twr.round_dp(DECIMAL_PRECISION),
            gain_loss_amount: gain_loss_amount.round_dp(DECIMAL_PRECISION),
            simple_return: simple_return.round_dp(DECIMAL_PRECISION),
            annualized_simple_return: annualized_simple_return.round_dp(DECIMAL_PRECISION),
            net_cash_flow,
            sub_period_count: sub_periods.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn point(d: NaiveDate, value: Decimal, flow: Decimal) -> ValuationPoint {
        ValuationPoint {
            date: d,
            total_value: value,
            net_flow: flow,
        }
    }

    #[test]
    fn test_single_sub_period_ten_percent() {
        let points = vec![
            point(date(2023, 1, 1), dec!(1000), Decimal::ZERO),
            point(date(2023, 12, 31), dec!(1100), Decimal::ZERO),
        ];
        let sub_periods: Vec<SubPeriod> = PerformanceService::build_sub_periods(&points)
            .into_iter()
            .map(|(_, p)| p)
            .collect();
        assert_eq!(sub_periods.len(), 1);

        let twr = PerformanceService::link_sub_periods(&sub_periods);
        assert_eq!(twr, dec!(0.1));

        // 2023-01-01..2023-12-31 inclusive is exactly 365 days
        let range = DateRange::new(date(2023, 1, 1), date(2023, 12, 31)).unwrap();
        assert_eq!(range.days(), 365);
        let annualized = PerformanceService::calculate_annualized_return(range.days(), twr);
        assert_eq!(annualized, twr);
    }

    #[test]
    fn test_flow_breaks_sub_period() {
        // 1000 grows to 1100, a 500 deposit lands (value 1600), then 10% again
        let points = vec![
            point(date(2024, 1, 1), dec!(1000), Decimal::ZERO),
            point(date(2024, 3, 1), dec!(1600), dec!(500)),
            point(date(2024, 6, 1), dec!(1760), Decimal::ZERO),
        ];
        let sub_periods: Vec<SubPeriod> = PerformanceService::build_sub_periods(&points)
            .into_iter()
            .map(|(_, p)| p)
            .collect();
        assert_eq!(sub_periods.len(), 2);
        assert_eq!(sub_periods[0].period_return(), dec!(0.1));
        assert_eq!(sub_periods[1].period_return(), dec!(0.1));

        let twr = PerformanceService::link_sub_periods(&sub_periods);
        assert_eq!(twr, dec!(0.21));
    }

    #[test]
    fn test_reordering_flow_segments_changes_twr() {
        let d0 = date(2024, 1, 1);
        let d1 = date(2024, 2, 1);
        let d2 = date(2024, 3, 1);

        let original = vec![
            point(d0, dec!(100), Decimal::ZERO),
            point(d1, dec!(160), dec!(50)),
            point(d2, dec!(140), dec!(-30)),
        ];
        let swapped = vec![
            point(d0, dec!(100), Decimal::ZERO),
            point(d1, dec!(140), dec!(-30)),
            point(d2, dec!(160), dec!(50)),
        ];

        let twr_original = PerformanceService::link_sub_periods(
            &PerformanceService::build_sub_periods(&original)
                .into_iter()
                .map(|(_, p)| p)
                .collect::<Vec<_>>(),
        );
        let twr_swapped = PerformanceService::link_sub_periods(
            &PerformanceService::build_sub_periods(&swapped)
                .into_iter()
                .map(|(_, p)| p)
                .collect::<Vec<_>>(),
        );

        assert_ne!(twr_original, twr_swapped);
    }

    #[test]
    fn test_non_positive_start_values_are_skipped() {
        let points = vec![
            point(date(2024, 1, 1), Decimal::ZERO, Decimal::ZERO),
            point(date(2024, 2, 1), dec!(100), dec!(100)),
            point(date(2024, 3, 1), dec!(110), Decimal::ZERO),
        ];
        let sub_periods = PerformanceService::build_sub_periods(&points);
        // Only the funded period survives
        assert_eq!(sub_periods.len(), 1);
        assert_eq!(sub_periods[0].1.period_return(), dec!(0.1));
    }

    #[test]
    fn test_annualized_return_caps_total_loss() {
        let annualized = PerformanceService::calculate_annualized_return(730, dec!(-1.0));
        assert_eq!(annualized, dec!(-1.0));
    }

    #[test]
    fn test_annualized_return_two_years() {
        // 21% over 730 days ~ 10% a year; 365/730 halves the exponent
        let annualized = PerformanceService::calculate_annualized_return(730, dec!(0.21));
        let expected = dec!(0.1);
        assert!((annualized - expected).abs() < dec!(0.0001));
    }

    mod service {
        use super::*;
        use crate::fx::{FxRepositoryTrait, FxService, FxServiceTrait};
        use crate::market_data::{MarketDataRepositoryTrait, Quote};
        use crate::models::DateRange;
        use crate::portfolio::holdings::{
            CashFlow, Holding, HoldingsValuationService, Instrument, InstrumentType,
        };

        struct EmptyFxRepository;
        impl FxRepositoryTrait for EmptyFxRepository {
            fn get_historical_exchange_rates(&self) -> Result<Vec<crate::fx::ExchangeRate>> {
                Ok(Vec::new())
            }
        }

        struct EmptyQuoteRepository;
        impl MarketDataRepositoryTrait for EmptyQuoteRepository {
            fn get_quote_on_or_before(
                &self,
                _symbol: &str,
                _date: NaiveDate,
            ) -> Result<Option<Quote>> {
                Ok(None)
            }
        }

        /// Cash-only account: total value on each date is just the cash
        /// balance recorded for that date.
        struct CashLedgerRepository {
            balances: Vec<(NaiveDate, Decimal)>,
            flows: Vec<CashFlow>,
        }

        impl HoldingsRepositoryTrait for CashLedgerRepository {
            fn get_holdings(&self, account_id: &str, date: NaiveDate) -> Result<Vec<Holding>> {
                let balance = self
                    .balances
                    .iter()
                    .filter(|(d, _)| *d <= date)
                    .max_by_key(|(d, _)| *d)
                    .map(|(_, v)| *v)
                    .unwrap_or(Decimal::ZERO);
                Ok(vec![Holding {
                    account_id: account_id.to_string(),
                    instrument: Instrument {
                        symbol: "$CASH-USD".to_string(),
                        name: None,
                        instrument_type: InstrumentType::Cash,
                    },
                    units: balance,
                    local_currency: "USD".to_string(),
                    as_of_date: date,
                }])
            }

            fn get_holding_dates_in_range(
                &self,
                _account_id: &str,
                range: &DateRange,
            ) -> Result<Vec<NaiveDate>> {
                Ok(self
                    .balances
                    .iter()
                    .map(|(d, _)| *d)
                    .filter(|d| range.contains(*d))
                    .collect())
            }

            fn get_external_cash_flows(
                &self,
                _account_id: &str,
                range: &DateRange,
            ) -> Result<Vec<CashFlow>> {
                Ok(self
                    .flows
                    .iter()
                    .copied()
                    .filter(|f| range.contains(f.date))
                    .collect())
            }
        }

        fn performance_service(
            balances: Vec<(NaiveDate, Decimal)>,
            flows: Vec<CashFlow>,
        ) -> PerformanceService {
            let fx = FxService::new(Arc::new(EmptyFxRepository));
            fx.initialize().unwrap();
            let valuation =
                HoldingsValuationService::new(Arc::new(fx), Arc::new(EmptyQuoteRepository));
            PerformanceService::new(
                Arc::new(CashLedgerRepository { balances, flows }),
                Arc::new(valuation),
                "USD",
            )
        }

        #[tokio::test]
        async fn test_twr_with_mid_period_deposit() {
            let service = performance_service(
                vec![
                    (date(2024, 1, 1), dec!(1000)),
                    (date(2024, 3, 1), dec!(1600)),
                    (date(2024, 6, 1), dec!(1760)),
                ],
                vec![CashFlow {
                    date: date(2024, 3, 1),
                    amount: dec!(500),
                }],
            );
            let range = DateRange::new(date(2024, 1, 1), date(2024, 6, 1)).unwrap();

            let metrics = service.calculate_twr("acct-1", &range).await.unwrap();
            assert_eq!(metrics.sub_period_count, 2);
            assert_eq!(metrics.cumulative_twr, dec!(0.21));
            assert_eq!(metrics.net_cash_flow, dec!(500));
            // 1760 - 1000 - 500
            assert_eq!(metrics.gain_loss_amount, dec!(260));
            assert_eq!(metrics.returns.first().unwrap().value, Decimal::ZERO);
            assert_eq!(metrics.returns.last().unwrap().value, dec!(0.21));

            // Periodic series: one +10% per sub-period, dated by its
            // closing boundary, never the chained cumulative values
            assert_eq!(metrics.sub_period_returns.len(), 2);
            assert_eq!(metrics.sub_period_returns[0].date, date(2024, 3, 1));
            assert_eq!(metrics.sub_period_returns[0].value, dec!(0.1));
            assert_eq!(metrics.sub_period_returns[1].date, date(2024, 6, 1));
            assert_eq!(metrics.sub_period_returns[1].value, dec!(0.1));
        }

        #[tokio::test]
        async fn test_no_flows_collapses_to_single_sub_period() {
            let service = performance_service(
                vec![(date(2024, 1, 1), dec!(1000)), (date(2024, 4, 1), dec!(1050))],
                Vec::new(),
            );
            let range = DateRange::new(date(2024, 1, 1), date(2024, 4, 1)).unwrap();

            let metrics = service.calculate_twr("acct-1", &range).await.unwrap();
            assert_eq!(metrics.sub_period_count, 1);
            assert_eq!(metrics.cumulative_twr, dec!(0.05));
        }

        #[tokio::test]
        async fn test_missing_holdings_data_is_an_error() {
            let service = performance_service(Vec::new(), Vec::new());
            let range = DateRange::new(date(2024, 1, 1), date(2024, 6, 1)).unwrap();

            let err = service.calculate_twr("acct-1", &range).await.unwrap_err();
            assert!(matches!(
                err,
                Error::Calculation(CalculatorError::InsufficientHoldingsData { .. })
            ));
        }

        #[tokio::test]
        async fn test_all_zero_start_values_is_an_error() {
            let service = performance_service(
                vec![(date(2024, 1, 1), Decimal::ZERO), (date(2024, 6, 1), Decimal::ZERO)],
                Vec::new(),
            );
            let range = DateRange::new(date(2024, 1, 1), date(2024, 6, 1)).unwrap();

            let err = service.calculate_twr("acct-1", &range).await.unwrap_err();
            assert!(matches!(
                err,
                Error::Calculation(CalculatorError::NoValidSubPeriods(_))
            ));
        }
    }
}
