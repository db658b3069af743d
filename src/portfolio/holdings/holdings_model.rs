use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum InstrumentType {
    Cash,
    Security,
}

impl InstrumentType {
    /// Resolves an instrument-type string from repository data.
    ///
    /// Fallback policy: anything that is not recognizably cash is treated
    /// as a security, so unknown upstream labels still get priced through
    /// the market-data path instead of being silently valued at 1.
    pub fn parse_or_default(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "CASH" => InstrumentType::Cash,
            "SECURITY" => InstrumentType::Security,
            other => {
                log::debug!("Unknown instrument type '{}', treating as Security", other);
                InstrumentType::Security
            }
        }
    }
}

/// Instrument identity as supplied by the holdings collaborator.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub symbol: String,
    pub name: Option<String>,
    pub instrument_type: InstrumentType,
}

/// An amount in the holding's local currency alongside its base-currency
/// equivalent.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonetaryValue {
    pub local: Decimal,
    pub base: Decimal,
}

impl MonetaryValue {
    pub fn zero() -> Self {
        MonetaryValue {
            local: Decimal::ZERO,
            base: Decimal::ZERO,
        }
    }
}

/// Raw position snapshot for one instrument at one date, as fetched from
/// the repository collaborator. Immutable; valuation produces a separate
/// `ValuedHolding` rather than mutating this.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub account_id: String,
    pub instrument: Instrument,
    pub units: Decimal,
    pub local_currency: String,
    pub as_of_date: NaiveDate,
}

/// A holding with its price and FX rate resolved for one valuation date.
/// Created fresh per (account, date) query and never cached across dates.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ValuedHolding {
    pub account_id: String,
    pub instrument: Instrument,
    pub units: Decimal,
    pub local_currency: String,
    pub base_currency: String,
    /// Unit price in the local currency (exactly 1 for cash).
    pub price: Decimal,
    /// Local -> base conversion rate (exactly 1 when already base).
    pub fx_rate: Decimal,
    pub market_value: MonetaryValue,
    pub as_of_date: NaiveDate,
}
