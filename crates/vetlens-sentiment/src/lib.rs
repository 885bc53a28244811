//! vetlens-sentiment — Japanese review sentiment scoring.
//!
//! Pure Rust BERT sequence classification using Candle, with weights
//! pulled straight from the Hugging Face Hub. No Python dependency.
//!
//! Two scorer implementations sit behind the [`SentimentScorer`] trait:
//! - [`BertSentimentScorer`] — the real thing, one per checkpoint
//! - [`LexiconScorer`] — deterministic keyword fallback, used when a
//!   checkpoint cannot be loaded and as the test double

pub mod bert;
pub mod config;
pub mod error;
pub mod lexicon;
pub mod scorer;

pub use bert::BertSentimentScorer;
pub use config::SentimentConfig;
pub use error::{Result, SentimentError};
pub use lexicon::LexiconScorer;
pub use scorer::{ScorerSet, SentimentScorer};
