pub mod performance_model;
pub mod performance_service;

pub use performance_model::{PerformanceMetrics, ReturnData, SubPeriod, ValuationPoint};
pub use performance_service::{PerformanceService, PerformanceServiceTrait};
