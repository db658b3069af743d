use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Decimal precision for calculated metrics
pub const DECIMAL_PRECISION: u32 = 6;

/// Calendar days per year used for annualizing a total return
pub const DAYS_PER_YEAR: i64 = 365;

/// Trading periods per year used for annualizing a daily return series
pub const TRADING_DAYS_PER_YEAR: u32 = 252;

/// Fallback for sqrt(252) if the decimal sqrt fails
pub const SQRT_TRADING_DAYS_APPROX: Decimal = dec!(15.874507866);

/// Ranges shorter than this produce annualized figures that are
/// informational only (the exponent blows up short-range noise)
pub const MIN_DAYS_FOR_MEANINGFUL_ANNUALIZATION: i64 = 30;
