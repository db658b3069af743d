use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::CalculatorError;

/// A flow-free holding interval for TWR linking.
///
/// `start_value` must be strictly positive: a zero or negative starting
/// value makes the period return undefined, so construction fails rather
/// than deferring the problem to the compounding loop. Serialize-only;
/// deserializing would sidestep that check.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubPeriod {
    start_value: Decimal,
    end_value: Decimal,
    net_flow: Decimal,
}

impl SubPeriod {
    pub fn new(
        start_value: Decimal,
        end_value: Decimal,
        net_flow: Decimal,
    ) -> Result<Self, CalculatorError> {
        if start_value <= Decimal::ZERO {
            return Err(CalculatorError::InvalidSubPeriod { start_value });
        }
        Ok(SubPeriod {
            start_value,
            end_value,
            net_flow,
        })
    }

    pub fn start_value(&self) -> Decimal {
        self.start_value
    }

    pub fn end_value(&self) -> Decimal {
        self.end_value
    }

    pub fn net_flow(&self) -> Decimal {
        self.net_flow
    }

    /// Investment gain net of external flows.
    pub fn gain(&self) -> Decimal {
        self.end_value - self.start_value - self.net_flow
    }

    pub fn period_return(&self) -> Decimal {
        self.gain() / self.start_value
    }
}

/// Total account value observed at a sub-period boundary, with the
/// external flow that landed on that boundary (zero if none).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValuationPoint {
    pub date: NaiveDate,
    pub total_value: Decimal,
    pub net_flow: Decimal,
}

/// A dated return observation. Whether the value is periodic or
/// cumulative depends on the series it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReturnData {
    pub date: NaiveDate,
    pub value: Decimal,
}

/// Immutable result of one TWR calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub account_id: String,
    pub period_start_date: NaiveDate,
    pub period_end_date: NaiveDate,
    pub base_currency: String,
    /// Cumulative TWR at each sub-period boundary, starting at zero.
    /// A charting series; not an input to risk metrics.
    pub returns: Vec<ReturnData>,
    /// Periodic return of each sub-period, dated by its closing
    /// boundary. This is the series volatility, drawdown and VaR
    /// calculations consume.
    pub sub_period_returns: Vec<ReturnData>,
    pub cumulative_twr: Decimal,
    /// `(1 + TWR)^(365/days) - 1` over the inclusive day count of the
    /// requested range. Informational only for ranges under ~30 days.
    pub annualized_twr: Decimal,
    pub gain_loss_amount: Decimal,
    pub simple_return: Decimal,
    pub annualized_simple_return: Decimal,
    pub net_cash_flow: Decimal,
    pub sub_period_count: usize,
}
