use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VolatilityLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SharpeRating {
    Poor,
    Fair,
    Good,
    Excellent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DrawdownSeverity {
    Minimal,
    Moderate,
    Severe,
}

/// One peak-to-recovery (or peak-to-series-end) decline in the
/// compounded cumulative-value series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DrawdownPeriod {
    /// Date of the peak the decline is measured from.
    pub start_date: NaiveDate,
    /// Recovery date, or the final series date if unrecovered.
    pub end_date: NaiveDate,
    /// Deepest decline from the peak, always <= 0.
    pub magnitude: Decimal,
    pub duration_days: i64,
    /// True when the cumulative value returned to or above the prior
    /// peak before the series ended.
    pub is_recovered: bool,
}

/// Default categorization bands. Annualized-volatility and drawdown
/// bounds are fractions (0.10 = 10%); drawdowns compare by magnitude.
pub const DEFAULT_VOLATILITY_MEDIUM: Decimal = dec!(0.10);
pub const DEFAULT_VOLATILITY_HIGH: Decimal = dec!(0.20);
pub const DEFAULT_SHARPE_FAIR: Decimal = dec!(0.5);
pub const DEFAULT_SHARPE_GOOD: Decimal = dec!(1.0);
pub const DEFAULT_SHARPE_EXCELLENT: Decimal = dec!(2.0);
pub const DEFAULT_DRAWDOWN_MODERATE: Decimal = dec!(0.10);
pub const DEFAULT_DRAWDOWN_SEVERE: Decimal = dec!(0.25);

/// Categorization bands injected into the risk calculator so reports can
/// be tuned per deployment without touching the math.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskThresholds {
    /// Volatility at or above this is Medium.
    pub volatility_medium: Decimal,
    /// Volatility at or above this is High.
    pub volatility_high: Decimal,
    /// Sharpe below this is Poor.
    pub sharpe_fair: Decimal,
    pub sharpe_good: Decimal,
    pub sharpe_excellent: Decimal,
    /// Drawdown magnitude at or above this is Moderate.
    pub drawdown_moderate: Decimal,
    /// Drawdown magnitude at or above this is Severe.
    pub drawdown_severe: Decimal,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        RiskThresholds {
            volatility_medium: DEFAULT_VOLATILITY_MEDIUM,
            volatility_high: DEFAULT_VOLATILITY_HIGH,
            sharpe_fair: DEFAULT_SHARPE_FAIR,
            sharpe_good: DEFAULT_SHARPE_GOOD,
            sharpe_excellent: DEFAULT_SHARPE_EXCELLENT,
            drawdown_moderate: DEFAULT_DRAWDOWN_MODERATE,
            drawdown_severe: DEFAULT_DRAWDOWN_SEVERE,
        }
    }
}

/// Immutable result of one risk-metrics computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMetricsResult {
    pub annualized_volatility: Decimal,
    /// 0 (and flagged in `warnings`) when volatility is zero.
    pub sharpe_ratio: Decimal,
    /// Largest peak-to-trough decline, <= 0.
    pub max_drawdown: Decimal,
    /// Decline from the most recent peak to the final value, <= 0.
    pub current_drawdown: Decimal,
    pub drawdown_periods: Vec<DrawdownPeriod>,
    /// 5th percentile of the historical return distribution.
    pub value_at_risk_95: Decimal,
    pub annualized_return: Decimal,
    pub risk_free_rate: Decimal,
    pub volatility_level: VolatilityLevel,
    pub sharpe_rating: SharpeRating,
    pub drawdown_severity: DrawdownSeverity,
    /// Composite 1 (lowest risk) to 10 (highest risk).
    pub risk_score: u8,
    pub warnings: Vec<String>,
    pub positive_factors: Vec<String>,
}
