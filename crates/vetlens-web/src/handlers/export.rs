//! GET /export_results — hospital aggregate table as CSV.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use vetlens_analysis::export::results_csv;
use vetlens_common::{ApiError, VetlensError};

use crate::state::SharedState;

pub async fn export_results(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse + std::fmt::Debug, ApiError> {
    let results = state.results.read().await;
    let results = results.as_ref().ok_or(VetlensError::NoResults)?;
    let csv_text = results_csv(results)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"analysis_results.csv\""),
        ],
        csv_text,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::state::AppState;
    use std::sync::Arc;
    use vetlens_sentiment::ScorerSet;

    #[tokio::test]
    async fn export_without_results_is_a_400() {
        let state = Arc::new(AppState::new(ScorerSet::lexicon(), &ServerConfig::default()));
        let err = export_results(State(state)).await.unwrap_err();
        assert_eq!(err.status, axum::http::StatusCode::BAD_REQUEST);
    }
}
