//! End-to-end analysis over an uploaded dataset.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use vetlens_common::{ModelKind, Result};
use vetlens_sentiment::ScorerSet;

use crate::dataset::Dataset;
use crate::metrics::{compute_performance, correlation_matrix, ModelPerformance};
use crate::scoring::{aggregate_by_hospital, score_reviews, HospitalStats, Progress, ScoredReview};

/// Dataset-level summary shown above the charts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasicStats {
    pub total_reviews: usize,
    pub unique_hospitals: usize,
    pub avg_rating: f64,
    pub avg_review_length: f64,
}

/// Everything later endpoints (`/get_charts`, `/statistical_test`,
/// `/export_results`) read. Held in memory, one dataset at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResults {
    pub scored: Vec<ScoredReview>,
    pub hospitals: Vec<HospitalStats>,
    pub performance: BTreeMap<ModelKind, ModelPerformance>,
    pub basic: BasicStats,
    pub star_distribution: BTreeMap<u8, usize>,
}

/// Score every review with every model, aggregate per hospital and
/// compute the performance metrics.
pub async fn run_analysis(
    dataset: &Dataset,
    scorers: &ScorerSet,
    progress: Progress<'_>,
) -> Result<AnalysisResults> {
    let scored = score_reviews(&dataset.records, scorers, progress).await?;
    let hospitals = aggregate_by_hospital(&scored);
    let performance = compute_performance(&hospitals);

    for (kind, perf) in &performance {
        info!(
            model = %kind,
            r = format!("{:.3}", perf.correlation),
            mae = format!("{:.3}", perf.mae),
            "Model performance"
        );
    }

    let stats = dataset.stats();
    let total_chars: usize = dataset.records.iter().map(|r| r.review_text.chars().count()).sum();
    let basic = BasicStats {
        total_reviews: stats.total_reviews,
        unique_hospitals: stats.unique_hospitals,
        avg_rating: stats.avg_star_rating,
        avg_review_length: total_chars as f64 / stats.total_reviews.max(1) as f64,
    };

    Ok(AnalysisResults {
        scored,
        hospitals,
        performance,
        basic,
        star_distribution: stats.star_distribution,
    })
}

impl AnalysisResults {
    /// Models ordered by ascending MAE (best first).
    pub fn models_by_mae(&self) -> Vec<ModelKind> {
        let mut models: Vec<ModelKind> = ModelKind::ALL.to_vec();
        models.sort_by(|a, b| {
            self.performance[a]
                .mae
                .partial_cmp(&self.performance[b].mae)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        models
    }

    /// Hospital star scores in hospital order, the truth series for
    /// every metric.
    pub fn star_series(&self) -> Vec<f64> {
        self.hospitals.iter().map(|h| h.star_score).collect()
    }

    /// One model's hospital means, aligned with [`Self::star_series`].
    pub fn model_series(&self, kind: ModelKind) -> Vec<f64> {
        self.hospitals.iter().map(|h| h.model_scores[&kind]).collect()
    }

    /// `model_comparison` payload keyed by display name.
    pub fn model_comparison(&self) -> Value {
        let mut out = serde_json::Map::new();
        for (kind, perf) in &self.performance {
            out.insert(
                kind.display_name().to_string(),
                json!({
                    "correlation": perf.correlation,
                    "p_value": perf.p_value,
                    "mae": perf.mae,
                }),
            );
        }
        Value::Object(out)
    }

    /// Model-vs-model correlation matrix keyed by display name.
    pub fn correlation_matrix(&self) -> BTreeMap<String, BTreeMap<String, f64>> {
        correlation_matrix(&self.hospitals)
    }

    /// Per-hospital summary for the drill-down table: review count,
    /// mean star rating, mean sentiment across all models.
    pub fn hospital_analysis(&self) -> Value {
        let mut out = serde_json::Map::new();
        for hospital in &self.hospitals {
            let avg_sentiment = hospital.model_scores.values().sum::<f64>()
                / hospital.model_scores.len().max(1) as f64;
            out.insert(
                hospital.hospital_id.clone(),
                json!({
                    "review_count": hospital.review_count,
                    "avg_rating": hospital.star_score + 3.0,
                    "avg_sentiment": avg_sentiment,
                }),
            );
        }
        Value::Object(out)
    }
}
