pub mod contribution;
pub mod holdings;
pub mod performance;
pub mod risk;

pub use contribution::*;
pub use holdings::*;
pub use performance::*;
pub use risk::*;
