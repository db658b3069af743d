use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FxError {
    #[error("No exchange rate found for {pair} on or before {date}")]
    RateNotFound { pair: String, date: NaiveDate },

    #[error("Cache error: {0}")]
    CacheError(String),
}

impl FxError {
    pub fn rate_not_found(from: &str, to: &str, date: NaiveDate) -> Self {
        FxError::RateNotFound {
            pair: format!("{}/{}", from, to),
            date,
        }
    }
}
