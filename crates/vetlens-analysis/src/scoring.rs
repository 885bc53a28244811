//! Per-review scoring and per-hospital aggregation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use vetlens_common::{ModelKind, ReviewRecord, Result, VetlensError};
use vetlens_sentiment::ScorerSet;

/// One review with its review score (−2..+2) per model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredReview {
    #[serde(flatten)]
    pub record: ReviewRecord,
    pub star_score: f64,
    pub model_scores: BTreeMap<ModelKind, f64>,
}

/// Per-hospital means over its reviews, the unit the metrics and charts
/// operate on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HospitalStats {
    pub hospital_id: String,
    pub review_count: usize,
    pub star_score: f64,
    pub model_scores: BTreeMap<ModelKind, f64>,
}

/// Progress callback invoked as each model finishes its pass.
pub type Progress<'a> = &'a mut (dyn FnMut(ModelKind, usize, usize) + Send);

/// Run every model over every review. Models run sequentially so the
/// UI can report progress model by model; each scorer batches
/// internally.
pub async fn score_reviews(
    records: &[ReviewRecord],
    scorers: &ScorerSet,
    progress: Progress<'_>,
) -> Result<Vec<ScoredReview>> {
    let texts: Vec<String> = records.iter().map(|r| r.review_text.clone()).collect();

    let mut per_model: BTreeMap<ModelKind, Vec<f64>> = BTreeMap::new();
    let total_models = ModelKind::ALL.len();
    for (done, (kind, scorer)) in scorers.iter().enumerate() {
        info!(model = %kind, reviews = texts.len(), "Scoring reviews");
        let scores = scorer
            .score_batch(&texts)
            .await
            .map_err(|e| VetlensError::Scoring(e.to_string()))?;
        per_model.insert(kind, scores.iter().map(|s| s.review_score()).collect());
        progress(kind, done + 1, total_models);
    }

    Ok(records
        .iter()
        .enumerate()
        .map(|(i, rec)| ScoredReview {
            record: rec.clone(),
            star_score: rec.star_score(),
            model_scores: per_model.iter().map(|(k, v)| (*k, v[i])).collect(),
        })
        .collect())
}

/// Group scored reviews by hospital and average every score column.
/// Output is sorted by hospital id.
pub fn aggregate_by_hospital(scored: &[ScoredReview]) -> Vec<HospitalStats> {
    let mut groups: BTreeMap<&str, Vec<&ScoredReview>> = BTreeMap::new();
    for review in scored {
        groups.entry(&review.record.hospital_id).or_default().push(review);
    }

    groups
        .into_iter()
        .map(|(hospital_id, reviews)| {
            let n = reviews.len() as f64;
            let star_score = reviews.iter().map(|r| r.star_score).sum::<f64>() / n;
            let model_scores = ModelKind::ALL
                .into_iter()
                .map(|kind| {
                    let mean =
                        reviews.iter().map(|r| r.model_scores[&kind]).sum::<f64>() / n;
                    (kind, mean)
                })
                .collect();
            HospitalStats {
                hospital_id: hospital_id.to_string(),
                review_count: reviews.len(),
                star_score,
                model_scores,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(hospital: &str, text: &str, stars: u8) -> ReviewRecord {
        ReviewRecord {
            hospital_id: hospital.to_string(),
            review_text: text.to_string(),
            star_rating: stars,
        }
    }

    #[tokio::test]
    async fn scores_every_review_with_every_model() {
        let records = vec![
            record("h1", "とても親切で丁寧な先生", 5),
            record("h2", "待ち時間が長い", 2),
        ];
        let mut calls = Vec::new();
        let scored = score_reviews(&records, &ScorerSet::lexicon(), &mut |kind, done, total| {
            calls.push((kind, done, total));
        })
        .await
        .unwrap();

        assert_eq!(scored.len(), 2);
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[2].1, 3);
        for review in &scored {
            assert_eq!(review.model_scores.len(), 3);
            for score in review.model_scores.values() {
                assert!((-2.0..=2.0).contains(score));
            }
        }
        // Positive review outscores the negative one under every model.
        for kind in ModelKind::ALL {
            assert!(scored[0].model_scores[&kind] > scored[1].model_scores[&kind]);
        }
    }

    #[tokio::test]
    async fn aggregation_averages_per_hospital() {
        let records = vec![
            record("h1", "良い", 5),
            record("h1", "悪い", 1),
            record("h2", "普通", 3),
        ];
        let scored = score_reviews(&records, &ScorerSet::lexicon(), &mut |_, _, _| {})
            .await
            .unwrap();
        let hospitals = aggregate_by_hospital(&scored);

        assert_eq!(hospitals.len(), 2);
        assert_eq!(hospitals[0].hospital_id, "h1");
        assert_eq!(hospitals[0].review_count, 2);
        // star scores: +2 and −2 average to 0
        assert!((hospitals[0].star_score - 0.0).abs() < 1e-9);
        assert_eq!(hospitals[1].hospital_id, "h2");
        assert!((hospitals[1].star_score - 0.0).abs() < 1e-9);

        let expected = (scored[0].model_scores[&ModelKind::Koheiduck]
            + scored[1].model_scores[&ModelKind::Koheiduck])
            / 2.0;
        assert!((hospitals[0].model_scores[&ModelKind::Koheiduck] - expected).abs() < 1e-9);
    }
}
