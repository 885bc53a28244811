//! GET /get_charts and /get_performance_metrics.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use vetlens_analysis::bootstrap::BootstrapConfig;
use vetlens_analysis::charts::{build_charts, ChartBundle};
use vetlens_common::{ApiError, VetlensError};

use crate::state::SharedState;

/// GET /get_charts — Plotly figure JSON for the dashboard.
pub async fn get_charts(
    State(state): State<SharedState>,
) -> Result<Json<ChartBundle>, ApiError> {
    let results = state
        .results
        .read()
        .await
        .clone()
        .ok_or(VetlensError::NoResults)?;

    // Bootstrap error bars are CPU-bound; keep them off the runtime.
    let bundle = tokio::task::spawn_blocking(move || {
        build_charts(&results, &BootstrapConfig::for_error_bars())
    })
    .await
    .map_err(|e| ApiError::internal(format!("chart build failed: {e}")))?;

    Ok(Json(bundle))
}

#[derive(Debug, Serialize)]
pub struct PerformanceResponse {
    pub success: bool,
    pub performance_metrics: Value,
}

/// GET /get_performance_metrics — metrics table without the figures.
pub async fn get_performance_metrics(
    State(state): State<SharedState>,
) -> Result<Json<PerformanceResponse>, ApiError> {
    let results = state.results.read().await;
    let results = results.as_ref().ok_or(VetlensError::NoResults)?;
    Ok(Json(PerformanceResponse {
        success: true,
        performance_metrics: results.model_comparison(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::state::AppState;
    use std::sync::Arc;
    use vetlens_analysis::{run_analysis, Dataset};
    use vetlens_common::ReviewRecord;
    use vetlens_sentiment::ScorerSet;

    async fn state_with_results() -> SharedState {
        let state = Arc::new(AppState::new(ScorerSet::lexicon(), &ServerConfig::default()));
        let dataset = Dataset::from_records(
            [
                ("h1", "親切で丁寧", 5),
                ("h2", "長い待ち時間", 2),
                ("h3", "普通", 3),
                ("h4", "清潔で安心", 4),
            ]
            .iter()
            .map(|(h, t, s)| ReviewRecord {
                hospital_id: h.to_string(),
                review_text: t.to_string(),
                star_rating: *s,
            })
            .collect(),
        )
        .unwrap();
        let results =
            run_analysis(&dataset, &state.scorers, &mut |_, _, _| {}).await.unwrap();
        *state.results.write().await = Some(results);
        state
    }

    #[tokio::test]
    async fn charts_require_results() {
        let state = Arc::new(AppState::new(ScorerSet::lexicon(), &ServerConfig::default()));
        let err = get_charts(State(state)).await.unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn charts_bundle_has_three_scatters_and_a_best_model() {
        let bundle = get_charts(State(state_with_results().await)).await.unwrap();
        assert_eq!(bundle.0.scatter_charts.len(), 3);
        assert!(bundle.0.model_list.contains(&bundle.0.best_model));
        assert_ne!(bundle.0.best_model, bundle.0.second_best_model);
    }

    #[tokio::test]
    async fn performance_metrics_cover_all_models() {
        let response =
            get_performance_metrics(State(state_with_results().await)).await.unwrap();
        assert!(response.0.success);
        let metrics = response.0.performance_metrics.as_object().unwrap();
        assert_eq!(metrics.len(), 3);
        for value in metrics.values() {
            assert!(value["mae"].as_f64().unwrap() >= 0.0);
            assert!(value["correlation"].is_number());
            assert!(value["p_value"].is_number());
        }
    }
}
