pub mod risk_model;
pub mod risk_service;

pub use risk_model::{
    DrawdownPeriod, DrawdownSeverity, RiskMetricsResult, RiskThresholds, SharpeRating,
    VolatilityLevel,
};
pub use risk_service::RiskMetricsCalculator;
