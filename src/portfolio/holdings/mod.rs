pub mod holdings_model;
pub mod holdings_traits;
pub mod holdings_valuation_service;

pub use holdings_model::{Holding, Instrument, InstrumentType, MonetaryValue, ValuedHolding};
pub use holdings_traits::{CashFlow, HoldingsRepositoryTrait};
pub use holdings_valuation_service::{
    total_base_value, HoldingsValuationService, HoldingsValuationServiceTrait,
};
