use crate::constants::DECIMAL_PRECISION;
use crate::errors::Result;
use crate::models::DateRange;
use crate::portfolio::holdings::{
    HoldingsRepositoryTrait, HoldingsValuationServiceTrait, ValuedHolding,
};
use async_trait::async_trait;
use log::debug;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

use super::{ContributionData, ContributionSummary};

#[async_trait]
pub trait ContributionServiceTrait: Send + Sync {
    /// Decomposes the portfolio return between the range endpoints into
    /// per-instrument weighted contributions.
    async fn calculate_contribution(
        &self,
        account_id: &str,
        range: &DateRange,
    ) -> Result<ContributionSummary>;
}

/// Matches instruments across the two endpoint snapshots by symbol.
///
/// Known gap: an instrument present at only one endpoint (opened or fully
/// liquidated mid-period) is excluded, so the sum of contributions can
/// understate the portfolio-level return over periods with trading
/// activity. This mirrors the established reporting behavior and is kept
/// pending product confirmation of a stricter mode.
pub struct ContributionService {
    holdings_repository: Arc<dyn HoldingsRepositoryTrait>,
    valuation_service: Arc<dyn HoldingsValuationServiceTrait>,
    base_currency: String,
}

impl ContributionService {
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

    /// Base values aggregated by symbol, preserving first-encounter order.
    fn aggregate_by_symbol(holdings: &[ValuedHolding]) -> (Vec<String>, HashMap<String, Decimal>) {
        let mut order = Vec::new();
        let mut totals: HashMap<String, Decimal> = HashMap::new();
        for holding in holdings {
            let symbol = holding.instrument.symbol.clone();
            match totals.entry(symbol.clone()) {
                std::collections::hash_map::Entry::Vacant(entry) => {
                    entry.insert(holding.market_value.base);
                    order.push(symbol);
                }
                std::collections::hash_map::Entry::Occupied(mut entry) => {
                    *entry.get_mut() += holding.market_value.base;
                }
            }
        }
        (order, totals)
    }

    /// Pure decomposition over two valued endpoint snapshots.
    pub fn decompose(
        start_holdings: &[ValuedHolding],
        end_holdings: &[ValuedHolding],
    ) -> Vec<ContributionData> {
        let (start_order, start_totals) = Self::aggregate_by_symbol(start_holdings);
        let (_, end_totals) = Self::aggregate_by_symbol(end_holdings);

        let total_start: Decimal = start_totals.values().copied().sum();
        let total_end: Decimal = end_totals.values().copied().sum();
        let total_absolute_return = total_end - total_start;

        if total_start <= Decimal::ZERO {
            debug!("Total start value {} is not positive; no weights", total_start);
            return Vec::new();
        }

        let mut entries = Vec::with_capacity(start_order.len());
        for symbol in start_order {
            let start_base = start_totals[&symbol];
            let end_base = match end_totals.get(&symbol) {
                Some(value) => *value,
                None => {
                    debug!("'{}' absent at period end; excluded", symbol);
                    continue;
                }
            };
            if start_base.is_zero() {
                debug!("'{}' has zero start value; excluded from weighting", symbol);
                continue;
            }

            let weight = start_base / total_start;
            let instrument_return = (end_base - start_base) / start_base;
            let absolute_contribution = end_base - start_base;
            // Share of total absolute return is undefined when the
            // portfolio broke even; report 0 by policy rather than fail.
            let percentage_contribution = if total_absolute_return.is_zero() {
                Decimal::ZERO
            } else {
                absolute_contribution / total_absolute_return
            };

            entries.push(ContributionData {
                symbol,
                weight: weight.round_dp(DECIMAL_PRECISION),
                instrument_return: instrument_return.round_dp(DECIMAL_PRECISION),
                contribution: (weight * instrument_return).round_dp(DECIMAL_PRECISION),
                start_value_base: start_base,
                end_value_base: end_base,
                absolute_contribution,
                percentage_contribution: percentage_contribution.round_dp(DECIMAL_PRECISION),
            });
        }
        entries
    }

    /// First-encountered entry with the strictly greatest key wins; ties
    /// keep the earlier entry.
    fn pick_by<F>(entries: &[ContributionData], better: F) -> Option<String>
    where
        F: Fn(Decimal, Decimal) -> bool,
    {
        let mut best: Option<&ContributionData> = None;
        for entry in entries {
            match best {
                None => best = Some(entry),
                Some(current) => {
                    if better(entry.contribution, current.contribution) {
                        best = Some(entry);
                    }
                }
            }
        }
        best.map(|e| e.symbol.clone())
    }
}

#[async_trait]
impl ContributionServiceTrait for ContributionService {
    async fn calculate_contribution(
        &self,
        account_id: &str,
        range: &DateRange,
    ) -> Result<ContributionSummary> {
        let start_raw = self
            .holdings_repository
            .get_holdings(account_id, range.start())?;
        let end_raw = self
            .holdings_repository
            .get_holdings(account_id, range.end())?;

        let start_holdings =
            self.valuation_service
                .value_holdings(&start_raw, &self.base_currency, range.start())?;
        let end_holdings =
            self.valuation_service
                .value_holdings(&end_raw, &self.base_currency, range.end())?;

        let total_start_value: Decimal =
            start_holdings.iter().map(|h| h.market_value.base).sum();
        let total_end_value: Decimal = end_holdings.iter().map(|h| h.market_value.base).sum();
        let total_absolute_return = total_end_value - total_start_value;

        let portfolio_return = if total_start_value.is_zero() {
            Decimal::ZERO
        } else {
            total_absolute_return / total_start_value
        };

        let mut entries = Self::decompose(&start_holdings, &end_holdings);

        let top_contributor = Self::pick_by(&entries, |candidate, best| candidate > best);
        let worst_contributor = Self::pick_by(&entries, |candidate, best| candidate < best);

        // Descending by contribution for presentation; stable, so equal
        // contributions keep first-encountered order.
        entries.sort_by(|a, b| b.contribution.cmp(&a.contribution));

        Ok(ContributionSummary {
            account_id: account_id.to_string(),
            period_start_date: range.start(),
            period_end_date: range.end(),
            base_currency: self.base_currency.clone(),
            total_start_value,
            total_end_value,
            portfolio_return: portfolio_return.round_dp(DECIMAL_PRECISION),
            total_absolute_return,
            entries,
            top_contributor,
            worst_contributor,
        })
    }
}
