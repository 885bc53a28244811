//! The scoring seam: one trait, one scorer per model.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use vetlens_common::{ModelKind, SentimentScore};

use crate::config::{ScorerBackend, SentimentConfig};
use crate::{BertSentimentScorer, LexiconScorer, Result};

/// Scores review texts with one sentiment model.
///
/// Implementations do their own preprocessing; callers pass raw review
/// text. Output order matches input order, one score per text.
#[async_trait]
pub trait SentimentScorer: Send + Sync {
    fn kind(&self) -> ModelKind;

    async fn score_batch(&self, texts: &[String]) -> Result<Vec<SentimentScore>>;

    async fn score_one(&self, text: &str) -> Result<SentimentScore> {
        let texts = [text.to_string()];
        let scores = self.score_batch(&texts).await?;
        Ok(scores.into_iter().next().unwrap_or(SentimentScore::NEUTRAL))
    }
}

/// All three model scorers, keyed by [`ModelKind`].
#[derive(Clone)]
pub struct ScorerSet {
    scorers: BTreeMap<ModelKind, Arc<dyn SentimentScorer>>,
}

impl ScorerSet {
    /// Build scorers per the configured backend. With the BERT backend,
    /// each checkpoint that fails to load falls back to the lexicon
    /// scorer for that model so the dashboard stays usable offline.
    pub async fn load(config: &SentimentConfig) -> Self {
        let mut scorers: BTreeMap<ModelKind, Arc<dyn SentimentScorer>> = BTreeMap::new();

        for kind in ModelKind::ALL {
            let scorer: Arc<dyn SentimentScorer> = match config.backend {
                ScorerBackend::Lexicon => Arc::new(LexiconScorer::new(kind)),
                ScorerBackend::Bert => match BertSentimentScorer::load(kind, config).await {
                    Ok(bert) => {
                        info!(model = %kind, "BERT scorer ready");
                        Arc::new(bert)
                    }
                    Err(e) => {
                        warn!(model = %kind, error = %e, "BERT load failed, falling back to lexicon scorer");
                        Arc::new(LexiconScorer::new(kind))
                    }
                },
            };
            scorers.insert(kind, scorer);
        }

        Self { scorers }
    }

    /// Lexicon-only set, deterministic and offline. Used in tests.
    pub fn lexicon() -> Self {
        let scorers = ModelKind::ALL
            .into_iter()
            .map(|kind| (kind, Arc::new(LexiconScorer::new(kind)) as Arc<dyn SentimentScorer>))
            .collect();
        Self { scorers }
    }

    pub fn get(&self, kind: ModelKind) -> &Arc<dyn SentimentScorer> {
        // Constructed with all variants present.
        &self.scorers[&kind]
    }

    pub fn iter(&self) -> impl Iterator<Item = (ModelKind, &Arc<dyn SentimentScorer>)> {
        self.scorers.iter().map(|(k, v)| (*k, v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lexicon_set_has_all_models() {
        let set = ScorerSet::lexicon();
        for kind in ModelKind::ALL {
            assert_eq!(set.get(kind).kind(), kind);
        }
        assert_eq!(set.iter().count(), 3);
    }

    #[tokio::test]
    async fn score_one_matches_batch() {
        let set = ScorerSet::lexicon();
        let scorer = set.get(ModelKind::Koheiduck);
        let text = "とても親切で丁寧な先生でした".to_string();
        let one = scorer.score_one(&text).await.unwrap();
        let batch = scorer.score_batch(&[text]).await.unwrap();
        assert_eq!(one, batch[0]);
    }
}
