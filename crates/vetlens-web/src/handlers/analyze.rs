//! POST /analyze — run all three models and aggregate.

use std::collections::BTreeMap;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use vetlens_analysis::{run_analysis, BasicStats, Dataset};
use vetlens_common::{ApiError, ReviewRecord, VetlensError};

use crate::state::{AppEvent, SharedState};

#[derive(Debug, Default, Deserialize)]
pub struct AnalyzeRequest {
    /// Rows the frontend got from `/load_sample_data`. When absent, the
    /// last uploaded dataset is analyzed.
    #[serde(default)]
    pub data: Option<Vec<ReviewRecord>>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub results: AnalyzeResults,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResults {
    pub basic_stats: BasicStats,
    pub model_comparison: Value,
    pub star_rating_distribution: BTreeMap<u8, usize>,
    pub correlation_matrix: BTreeMap<String, BTreeMap<String, f64>>,
    pub hospital_analysis: Value,
}

pub async fn analyze(
    State(state): State<SharedState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let dataset = match request.data {
        Some(rows) if !rows.is_empty() => {
            let dataset = Dataset::from_records(rows)?;
            *state.dataset.write().await = Some(dataset.clone());
            dataset
        }
        _ => state
            .dataset
            .read()
            .await
            .clone()
            .ok_or(VetlensError::NoDataset)?,
    };

    info!(reviews = dataset.records.len(), "Starting analysis");
    let event_tx = state.event_tx.clone();
    let results = run_analysis(&dataset, &state.scorers, &mut |model, completed, total| {
        let _ = event_tx.send(AppEvent::AnalysisProgress {
            model: model.display_name().to_string(),
            completed,
            total,
        });
    })
    .await?;

    state.publish(AppEvent::AnalysisComplete { hospitals: results.hospitals.len() });

    let response = AnalyzeResults {
        basic_stats: results.basic.clone(),
        model_comparison: results.model_comparison(),
        star_rating_distribution: results.star_distribution.clone(),
        correlation_matrix: results.correlation_matrix(),
        hospital_analysis: results.hospital_analysis(),
    };
    *state.results.write().await = Some(results);

    Ok(Json(AnalyzeResponse { success: true, results: response }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::state::AppState;
    use std::sync::Arc;
    use vetlens_sentiment::ScorerSet;

    fn test_state() -> SharedState {
        Arc::new(AppState::new(ScorerSet::lexicon(), &ServerConfig::default()))
    }

    fn rows() -> Vec<ReviewRecord> {
        [
            ("h1", "とても親切で丁寧な先生でした", 5),
            ("h1", "清潔で安心できました", 4),
            ("h2", "待ち時間が長い", 2),
            ("h2", "料金が高い", 2),
            ("h3", "普通です", 3),
        ]
        .iter()
        .map(|(h, t, s)| ReviewRecord {
            hospital_id: h.to_string(),
            review_text: t.to_string(),
            star_rating: *s,
        })
        .collect()
    }

    #[tokio::test]
    async fn analyze_inline_rows_returns_full_results() {
        let state = test_state();
        let response = analyze(
            State(state.clone()),
            Json(AnalyzeRequest { data: Some(rows()) }),
        )
        .await
        .unwrap();

        assert!(response.0.success);
        let results = &response.0.results;
        assert_eq!(results.basic_stats.total_reviews, 5);
        assert_eq!(results.basic_stats.unique_hospitals, 3);
        assert_eq!(results.correlation_matrix.len(), 3);
        assert_eq!(results.model_comparison.as_object().unwrap().len(), 3);
        assert_eq!(results.star_rating_distribution.values().sum::<usize>(), 5);

        // Results are stored for /get_charts and /statistical_test.
        assert!(state.results.read().await.is_some());
    }

    #[tokio::test]
    async fn analyze_uses_stored_dataset_when_no_rows_sent() {
        let state = test_state();
        *state.dataset.write().await = Some(Dataset::from_records(rows()).unwrap());

        let response = analyze(State(state), Json(AnalyzeRequest::default())).await.unwrap();
        assert_eq!(response.0.results.basic_stats.total_reviews, 5);
    }

    #[tokio::test]
    async fn analyze_without_dataset_is_a_400() {
        let err = analyze(State(test_state()), Json(AnalyzeRequest::default()))
            .await
            .unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn analyze_emits_progress_events() {
        let state = test_state();
        let mut rx = state.subscribe();
        analyze(State(state), Json(AnalyzeRequest { data: Some(rows()) })).await.unwrap();

        let mut progress_events = 0;
        let mut complete_events = 0;
        while let Ok(event) = rx.try_recv() {
            match event {
                AppEvent::AnalysisProgress { total, .. } => {
                    assert_eq!(total, 3);
                    progress_events += 1;
                }
                AppEvent::AnalysisComplete { hospitals } => {
                    assert_eq!(hospitals, 3);
                    complete_events += 1;
                }
                _ => {}
            }
        }
        assert_eq!(progress_events, 3);
        assert_eq!(complete_events, 1);
    }
}
