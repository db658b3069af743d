pub mod constants;
pub mod errors;
pub mod models;

pub mod fx;
pub mod market_data;
pub mod portfolio;

pub use errors::{Error, Result};
pub use models::DateRange;
pub use portfolio::*;
