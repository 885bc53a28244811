//! Deterministic keyword-count fallback scorer.
//!
//! Mirrors the behavior of the real models closely enough to exercise the
//! whole pipeline offline: positive/negative keyword counts, a fixed
//! per-model bias, and a small text-hash jitter so scores are not flat.

use async_trait::async_trait;
use std::hash::{DefaultHasher, Hash, Hasher};

use vetlens_common::preprocess::clean_review_text;
use vetlens_common::{ModelKind, SentimentScore};

use crate::scorer::SentimentScorer;
use crate::Result;

const POSITIVE_WORDS: &[&str] = &[
    "良い", "よい", "親切", "丁寧", "安心", "素晴らしい", "優しい", "清潔", "的確", "頼り",
];
const NEGATIVE_WORDS: &[&str] = &[
    "悪い", "わるい", "高い", "長い", "狭い", "不便", "不十分", "古い", "不安",
];

pub struct LexiconScorer {
    kind: ModelKind,
}

impl LexiconScorer {
    pub fn new(kind: ModelKind) -> Self {
        Self { kind }
    }

    fn score_text(&self, raw: &str) -> SentimentScore {
        let text = clean_review_text(raw);
        if text.is_empty() {
            return SentimentScore::NEUTRAL;
        }

        let positive_hits = POSITIVE_WORDS.iter().filter(|w| text.contains(*w)).count() as f64;
        let negative_hits = NEGATIVE_WORDS.iter().filter(|w| text.contains(*w)).count() as f64;

        let bias = self.kind.lexicon_bias();
        let base_positive = 0.4 + positive_hits * 0.15 - negative_hits * 0.1 + bias;
        let base_negative = 0.4 + negative_hits * 0.15 - positive_hits * 0.1 - bias;

        let total = base_positive + base_negative;
        let mut positive = if total > 0.0 { base_positive / total } else { 0.5 };

        // Stable jitter in ±0.05 keyed on text + model, so identical
        // input always scores identically.
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        self.kind.hub_id().hash(&mut hasher);
        let jitter = ((hasher.finish() % 1000) as f64 / 1000.0 - 0.5) * 0.1;

        positive = (positive + jitter).clamp(0.0, 1.0);
        SentimentScore::new(positive, 0.0, 1.0 - positive)
    }
}

#[async_trait]
impl SentimentScorer for LexiconScorer {
    fn kind(&self) -> ModelKind {
        self.kind
    }

    async fn score_batch(&self, texts: &[String]) -> Result<Vec<SentimentScore>> {
        Ok(texts.iter().map(|t| self.score_text(t)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> LexiconScorer {
        LexiconScorer::new(ModelKind::Koheiduck)
    }

    #[tokio::test]
    async fn positive_keywords_push_positive() {
        let score = scorer().score_one("先生がとても親切で丁寧、安心できました").await.unwrap();
        assert!(score.positive > 0.6, "got {score:?}");
        assert!(score.review_score() > 0.0);
    }

    #[tokio::test]
    async fn negative_keywords_push_negative() {
        let score = scorer().score_one("待ち時間が長い上に料金も高い。不安になった").await.unwrap();
        assert!(score.negative > 0.6, "got {score:?}");
        assert!(score.review_score() < 0.0);
    }

    #[tokio::test]
    async fn empty_text_is_neutral() {
        assert_eq!(scorer().score_one("").await.unwrap(), SentimentScore::NEUTRAL);
        assert_eq!(scorer().score_one("🐶🐱").await.unwrap(), SentimentScore::NEUTRAL);
    }

    #[tokio::test]
    async fn scoring_is_deterministic() {
        let a = scorer().score_one("普通の病院でした").await.unwrap();
        let b = scorer().score_one("普通の病院でした").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn models_disagree_on_the_same_text() {
        let text = "良い先生ですが待ち時間が長い".to_string();
        let a = LexiconScorer::new(ModelKind::Koheiduck).score_one(&text).await.unwrap();
        let b = LexiconScorer::new(ModelKind::LlmBook).score_one(&text).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn probabilities_sum_to_one() {
        let score = scorer().score_one("清潔で頼りになる病院").await.unwrap();
        assert!((score.positive + score.neutral + score.negative - 1.0).abs() < 1e-9);
    }
}
