//! vetlens-common — shared types for the review sentiment dashboard.

pub mod error;
pub mod model;
pub mod preprocess;
pub mod review;

pub use error::{ApiError, Result, VetlensError};
pub use model::ModelKind;
pub use review::{ReviewRecord, SentimentScore};
