use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single observed exchange rate: one unit of `from_currency` buys
/// `rate` units of `to_currency` at `timestamp`.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub id: String,
    pub from_currency: String,
    pub to_currency: String,
    pub rate: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl ExchangeRate {
    pub fn new(
        from_currency: &str,
        to_currency: &str,
        rate: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        ExchangeRate {
            id: Self::make_fx_symbol(from_currency, to_currency),
            from_currency: from_currency.to_string(),
            to_currency: to_currency.to_string(),
            rate,
            timestamp,
        }
    }

    pub fn make_fx_symbol(from: &str, to: &str) -> String {
        format!("{}{}=X", from, to)
    }

    /// Splits `USDGBP` / `USDGBP=X` into its currency codes. `None` when
    /// the symbol is too short to hold two 3-letter codes.
    pub fn parse_fx_symbol(symbol: &str) -> Option<(String, String)> {
        let base_symbol = symbol.strip_suffix("=X").unwrap_or(symbol);
        let from = base_symbol.get(..3)?;
        let to = base_symbol.get(3..6)?;
        Some((from.to_string(), to.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fx_symbol_round_trip() {
        let symbol = ExchangeRate::make_fx_symbol("USD", "GBP");
        assert_eq!(symbol, "USDGBP=X");
        let (from, to) = ExchangeRate::parse_fx_symbol(&symbol).unwrap();
        assert_eq!(from, "USD");
        assert_eq!(to, "GBP");

        let (from, to) = ExchangeRate::parse_fx_symbol("EURUSD").unwrap();
        assert_eq!(from, "EUR");
        assert_eq!(to, "USD");
    }

    #[test]
    fn test_parse_fx_symbol_rejects_truncated_input() {
        assert!(ExchangeRate::parse_fx_symbol("").is_none());
        assert!(ExchangeRate::parse_fx_symbol("US").is_none());
        assert!(ExchangeRate::parse_fx_symbol("USDG").is_none());
        assert!(ExchangeRate::parse_fx_symbol("US=X").is_none());
    }
}
