//! Configuration for the sentiment scorers.

use serde::{Deserialize, Serialize};

/// Which scorer backend to build at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScorerBackend {
    /// Real BERT checkpoints from the Hugging Face Hub, lexicon fallback
    /// per model on load failure.
    #[default]
    Bert,
    /// Lexicon only; no network or model downloads. Useful for demos,
    /// CI and offline development.
    Lexicon,
}

/// Configuration shared by all three model scorers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentConfig {
    pub backend: ScorerBackend,

    /// Maximum sequence length (default: 512)
    pub max_length: usize,

    /// Batch size for inference (default: 16)
    pub batch_size: usize,

    /// Use GPU if available (default: true)
    pub use_gpu: bool,

    /// Maximum score cache entries per model (0 disables caching)
    pub cache_size: usize,
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            backend: ScorerBackend::Bert,
            max_length: 512,
            batch_size: 16,
            use_gpu: true,
            cache_size: 10_000,
        }
    }
}

impl SentimentConfig {
    /// CPU-only BERT inference.
    pub fn cpu() -> Self {
        Self { use_gpu: false, ..Default::default() }
    }

    /// Lexicon-only configuration, no model downloads.
    pub fn lexicon() -> Self {
        Self { backend: ScorerBackend::Lexicon, ..Default::default() }
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }
}
