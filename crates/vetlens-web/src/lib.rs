//! vetlens-web — the review sentiment dashboard server.
//! Provides:
//!   - CSV upload and sample-data loading
//!   - Three-model sentiment analysis with live progress over SSE
//!   - Plotly chart JSON for the browser
//!   - Bootstrap significance testing between model pairs
//!   - CSV export of the per-hospital aggregate table

pub mod config;
pub mod handlers;
pub mod router;
pub mod sse;
pub mod state;
