use chrono::NaiveDate;
use thiserror::Error;

use crate::fx::FxError;

// Create a type alias for Result using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the analytics engine
#[derive(Error, Debug)]
pub enum Error {
    #[error("Currency operation failed: {0}")]
    Fx(#[from] FxError),

    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Calculation failed: {0}")]
    Calculation(#[from] CalculatorError),
}

#[derive(Error, Debug)]
pub enum MarketDataError {
    #[error("No price found for '{symbol}' on or before {date}")]
    PriceNotFound { symbol: String, date: NaiveDate },
}

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

#[derive(Error, Debug)]
pub enum CalculatorError {
    #[error("Account '{account_id}': no holding data between {start} and {end}")]
    InsufficientHoldingsData {
        account_id: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Return series too short: {observations} observation(s), need at least 2")]
    InsufficientReturnSeries { observations: usize },

    #[error("Sub-period start value must be positive, got {start_value}")]
    InvalidSubPeriod { start_value: rust_decimal::Decimal },

    #[error("No valid sub-periods could be constructed: {0}")]
    NoValidSubPeriods(String),

    #[error("Calculation error: {0}")]
    Calculation(String),
}

// Add From implementation for rust_decimal::Error
impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}
