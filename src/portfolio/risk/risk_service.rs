use crate::constants::{DECIMAL_PRECISION, SQRT_TRADING_DAYS_APPROX, TRADING_DAYS_PER_YEAR};
use crate::errors::{CalculatorError, Result};
use crate::portfolio::performance::ReturnData;
use log::debug;
use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use super::{
    DrawdownPeriod, DrawdownSeverity, RiskMetricsResult, RiskThresholds, SharpeRating,
    VolatilityLevel,
};

/// Confidence level for the historical-simulation VaR, in percent.
const VAR_CONFIDENCE_PERCENT: usize = 95;

/// Derives volatility, Sharpe ratio, drawdowns and Value-at-Risk from a
/// periodic return series. Pure computation; the series is produced
/// upstream (typically TWR sub-returns).
pub struct RiskMetricsCalculator {
    thresholds: RiskThresholds,
    periods_per_year: u32,
}

impl Default for RiskMetricsCalculator {
    fn default() -> Self {
        Self::new(RiskThresholds::default())
    }
}

impl RiskMetricsCalculator {
    pub fn new(thresholds: RiskThresholds) -> Self {
        Self {
            thresholds,
            periods_per_year: TRADING_DAYS_PER_YEAR,
        }
    }

    pub fn with_periods_per_year(mut self, periods_per_year: u32) -> Self {
        self.periods_per_year = periods_per_year;
        self
    }

    pub fn calculate(
        &self,
        returns: &[ReturnData],
        risk_free_rate: Decimal,
    ) -> Result<RiskMetricsResult> {
        if returns.len() < 2 {
            return Err(CalculatorError::InsufficientReturnSeries {
                observations: returns.len(),
            }
            .into());
        }
        debug!("Calculating risk metrics over {} observations", returns.len());

        let values: Vec<Decimal> = returns.iter().map(|r| r.value).collect();

        let annualized_volatility = self.annualized_volatility(&values);
        let annualized_return = self.annualized_return(&values);
        let (max_drawdown, current_drawdown, drawdown_periods) = Self::analyze_drawdowns(returns);
        let value_at_risk_95 = Self::historical_var_95(&values);

        let mut warnings = Vec::new();
        let mut positive_factors = Vec::new();

        // Sharpe is undefined at zero volatility; report 0 and flag it
        // rather than fail (numeric policy, not an error).
        let sharpe_ratio = if annualized_volatility.is_zero() {
            warnings.push("Volatility is zero; Sharpe ratio reported as 0".to_string());
            Decimal::ZERO
        } else {
            (annualized_return - risk_free_rate) / annualized_volatility
        };

        let volatility_level = self.assess_volatility(annualized_volatility);
        let sharpe_rating = self.assess_sharpe(sharpe_ratio);
        let drawdown_severity = self.assess_drawdown(max_drawdown);
        let risk_score = Self::risk_score(volatility_level, sharpe_rating, drawdown_severity);

        match volatility_level {
            VolatilityLevel::Low => positive_factors.push(format!(
                "Low annualized volatility ({})",
                annualized_volatility.round_dp(4)
            )),
            VolatilityLevel::Medium => {}
            VolatilityLevel::High => warnings.push(format!(
                "High annualized volatility ({})",
                annualized_volatility.round_dp(4)
            )),
        }
        match sharpe_rating {
            SharpeRating::Poor => {
                if sharpe_ratio < Decimal::ZERO {
                    warnings.push("Return does not compensate for risk taken".to_string());
                }
            }
            SharpeRating::Fair => {}
            SharpeRating::Good | SharpeRating::Excellent => positive_factors.push(format!(
                "Strong risk-adjusted return (Sharpe {})",
                sharpe_ratio.round_dp(2)
            )),
        }
        match drawdown_severity {
            DrawdownSeverity::Minimal => {
                positive_factors.push("Minimal historical drawdown".to_string())
            }
            DrawdownSeverity::Moderate => {}
            DrawdownSeverity::Severe => warnings.push(format!(
                "Severe maximum drawdown ({})",
                max_drawdown.round_dp(4)
            )),
        }

        Ok(RiskMetricsResult {
            annualized_volatility: annualized_volatility.round_dp(DECIMAL_PRECISION),
            sharpe_ratio: sharpe_ratio.round_dp(DECIMAL_PRECISION),
            max_drawdown: max_drawdown.round_dp(DECIMAL_PRECISION),
            current_drawdown: current_drawdown.round_dp(DECIMAL_PRECISION),
            drawdown_periods,
            value_at_risk_95: value_at_risk_95.round_dp(DECIMAL_PRECISION),
            annualized_return: annualized_return.round_dp(DECIMAL_PRECISION),
            risk_free_rate,
            volatility_level,
            sharpe_rating,
            drawdown_severity,
            risk_score,
            warnings,
            positive_factors,
        })
    }

    /// Sample standard deviation of periodic returns, scaled by
    /// sqrt(periods per year).
    fn annualized_volatility(&self, values: &[Decimal]) -> Decimal {
        if values.len() < 2 {
            return Decimal::ZERO;
        }

        let count = Decimal::from(values.len());
        let mean = values.iter().copied().sum::<Decimal>() / count;
        let sum_squared_diff: Decimal = values
            .iter()
            .map(|&r| {
                let diff = r - mean;
                diff * diff
            })
            .sum();

        let variance = sum_squared_diff / (count - Decimal::ONE);
        if variance.is_sign_negative() {
            return Decimal::ZERO;
        }
        let periodic_volatility = variance.sqrt().unwrap_or(Decimal::ZERO);

        let annualization_factor = Decimal::from(self.periods_per_year)
            .sqrt()
            .unwrap_or(SQRT_TRADING_DAYS_APPROX);

        periodic_volatility * annualization_factor
    }

    /// Compounds the series and scales to a yearly horizon:
    /// `(1 + cumulative)^(periods_per_year / n) - 1`.
    fn annualized_return(&self, values: &[Decimal]) -> Decimal {
        let cumulative = values
            .iter()
            .copied()
            .fold(Decimal::ONE, |acc, r| acc * (Decimal::ONE + r))
            - Decimal::ONE;

        if cumulative <= dec!(-1.0) {
            return dec!(-1.0);
        }

        let exponent = Decimal::from(self.periods_per_year) / Decimal::from(values.len() as u64);
        if exponent == Decimal::ONE {
            return cumulative;
        }
        (Decimal::ONE + cumulative).powd(exponent) - Decimal::ONE
    }

    /// Compounds the return series from a base of 1.0 and tracks declines
    /// against the running peak. Returns (max drawdown, current drawdown,
    /// periods); all drawdowns are <= 0.
    fn analyze_drawdowns(
        returns: &[ReturnData],
    ) -> (Decimal, Decimal, Vec<DrawdownPeriod>) {
        let mut cumulative = Decimal::ONE;
        let mut peak = Decimal::ONE;
        let mut peak_date = returns[0].date;
        let mut trough = Decimal::ZERO;
        let mut in_drawdown = false;
        let mut periods = Vec::new();

        for point in returns {
            cumulative *= Decimal::ONE + point.value;

            if cumulative >= peak {
                if in_drawdown {
                    periods.push(DrawdownPeriod {
                        start_date: peak_date,
                        end_date: point.date,
                        magnitude: trough,
                        duration_days: (point.date - peak_date).num_days(),
                        is_recovered: true,
                    });
                    in_drawdown = false;
                    trough = Decimal::ZERO;
                }
                peak = cumulative;
                peak_date = point.date;
            } else {
                in_drawdown = true;
                // peak starts at 1 and never shrinks, so this is defined
                let decline = cumulative / peak - Decimal::ONE;
                trough = trough.min(decline);
            }
        }

        let last_date = returns[returns.len() - 1].date;
        let current_drawdown = (cumulative / peak - Decimal::ONE).min(Decimal::ZERO);

        if in_drawdown {
            periods.push(DrawdownPeriod {
                start_date: peak_date,
                end_date: last_date,
                magnitude: trough,
                duration_days: (last_date - peak_date).num_days(),
                is_recovered: false,
            });
        }

        let max_drawdown = periods
            .iter()
            .map(|p| p.magnitude)
            .min()
            .unwrap_or(Decimal::ZERO);

        (max_drawdown, current_drawdown, periods)
    }

    /// Historical-simulation VaR: the return at the 5th percentile of the
    /// observed distribution (no parametric assumption).
    fn historical_var_95(values: &[Decimal]) -> Decimal {
        let mut sorted = values.to_vec();
        sorted.sort();
        let index = sorted.len() * (100 - VAR_CONFIDENCE_PERCENT) / 100;
        sorted[index.min(sorted.len() - 1)]
    }

    fn assess_volatility(&self, volatility: Decimal) -> VolatilityLevel {
        if volatility >= self.thresholds.volatility_high {
            VolatilityLevel::High
        } else if volatility >= self.thresholds.volatility_medium {
            VolatilityLevel::Medium
        } else {
            VolatilityLevel::Low
        }
    }

    fn assess_sharpe(&self, sharpe: Decimal) -> SharpeRating {
        if sharpe >= self.thresholds.sharpe_excellent {
            SharpeRating::Excellent
        } else if sharpe >= self.thresholds.sharpe_good {
            SharpeRating::Good
        } else if sharpe >= self.thresholds.sharpe_fair {
            SharpeRating::Fair
        } else {
            SharpeRating::Poor
        }
    }

    fn assess_drawdown(&self, max_drawdown: Decimal) -> DrawdownSeverity {
        let magnitude = max_drawdown.abs();
        if magnitude >= self.thresholds.drawdown_severe {
            DrawdownSeverity::Severe
        } else if magnitude >= self.thresholds.drawdown_moderate {
            DrawdownSeverity::Moderate
        } else {
            DrawdownSeverity::Minimal
        }
    }

    /// Composite 1-10 score: each dimension adds 0-3 to a base of 1.
    fn risk_score(
        volatility: VolatilityLevel,
        sharpe: SharpeRating,
        drawdown: DrawdownSeverity,
    ) -> u8 {
        let volatility_points = match volatility {
            VolatilityLevel::Low => 0,
            VolatilityLevel::Medium => 1,
            VolatilityLevel::High => 3,
        };
        let drawdown_points = match drawdown {
            DrawdownSeverity::Minimal => 0,
            DrawdownSeverity::Moderate => 1,
            DrawdownSeverity::Severe => 3,
        };
        let sharpe_points = match sharpe {
            SharpeRating::Excellent => 0,
            SharpeRating::Good => 1,
            SharpeRating::Fair => 2,
            SharpeRating::Poor => 3,
        };
        (1 + volatility_points + drawdown_points + sharpe_points).min(10)
    }
}
