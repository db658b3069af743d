pub mod contribution_model;
pub mod contribution_service;

pub use contribution_model::{ContributionData, ContributionSummary};
pub use contribution_service::{ContributionService, ContributionServiceTrait};
