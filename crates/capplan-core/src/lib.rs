pub mod error;
pub mod types;

#[cfg(feature = "scoring")]
pub mod scoring;

#[cfg(feature = "ranking")]
pub mod ranking;

#[cfg(feature = "investment")]
pub mod investment;

#[cfg(feature = "forecasting")]
pub mod forecasting;

#[cfg(feature = "rating")]
pub mod rating;

pub use error::CapPlanError;
pub use types::*;

/// Standard result type for all capplan operations
pub type CapPlanResult<T> = Result<T, CapPlanError>;
