//! Identities of the three pre-trained Japanese sentiment models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three models compared by the dashboard. Order is fixed; every
/// chart and table lists them A → C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ModelKind {
    Koheiduck,
    LlmBook,
    Mizuiro,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [ModelKind::Koheiduck, ModelKind::LlmBook, ModelKind::Mizuiro];

    /// Hugging Face Hub repository for the checkpoint.
    pub fn hub_id(&self) -> &'static str {
        match self {
            ModelKind::Koheiduck => "koheiduck/bert-japanese-finetuned-sentiment",
            ModelKind::LlmBook => "llm-book/bert-base-japanese-v2-finetuned-sentiment",
            ModelKind::Mizuiro => "Mizuiro-inc/bert-base-japanese-finetuned-sentiment-analysis",
        }
    }

    /// Human-facing label used in charts, tables and API payloads.
    pub fn display_name(&self) -> &'static str {
        match self {
            ModelKind::Koheiduck => "Model A (Koheiduck)",
            ModelKind::LlmBook => "Model B (LLM-book)",
            ModelKind::Mizuiro => "Model C (Mizuiro)",
        }
    }

    /// Per-model bias used by the lexicon fallback scorer so the three
    /// models remain distinguishable without real checkpoints.
    pub fn lexicon_bias(&self) -> f64 {
        match self {
            ModelKind::Koheiduck => 0.0,
            ModelKind::LlmBook => 0.1,
            ModelKind::Mizuiro => -0.05,
        }
    }

    /// Resolve a model from its display name (the frontend sends display
    /// names back in `/statistical_test` requests).
    pub fn from_display_name(name: &str) -> Option<ModelKind> {
        ModelKind::ALL.into_iter().find(|m| m.display_name() == name)
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelKind::from_display_name(s)
            .or_else(|| ModelKind::ALL.into_iter().find(|m| m.hub_id() == s))
            .ok_or_else(|| format!("unknown model: {s}"))
    }
}
