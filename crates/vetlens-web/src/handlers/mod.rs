//! HTTP handlers for all dashboard routes.

pub mod analyze;
pub mod charts;
pub mod dashboard;
pub mod export;
pub mod upload;
