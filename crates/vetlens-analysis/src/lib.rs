//! vetlens-analysis — dataset ingest, scoring, statistics and charts.
//!
//! Everything between "CSV bytes arrived" and "JSON the frontend can
//! plot": validation, per-review sentiment scoring, per-hospital
//! aggregation, model performance metrics, bootstrap confidence
//! intervals and Plotly figure construction.

pub mod bootstrap;
pub mod charts;
pub mod dataset;
pub mod export;
pub mod metrics;
pub mod results;
pub mod scoring;

pub use bootstrap::{BootstrapConfig, MaeDifferenceTest};
pub use dataset::{Dataset, DatasetStats};
pub use metrics::ModelPerformance;
pub use results::{run_analysis, AnalysisResults, BasicStats};
pub use scoring::{HospitalStats, ScoredReview};
