//! Dataset intake: CSV upload, bundled sample loading and download.

use axum::extract::{Multipart, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use tracing::info;

use vetlens_analysis::{Dataset, DatasetStats};
use vetlens_common::{ApiError, ReviewRecord};

use crate::state::{AppEvent, SharedState};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub stats: DatasetStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_loaded: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct SampleDataResponse {
    pub success: bool,
    pub data: Vec<ReviewRecord>,
    pub message: String,
}

/// Store a validated dataset and publish the load event.
async fn install_dataset(state: &SharedState, dataset: Dataset) -> DatasetStats {
    let stats = dataset.stats();
    state.publish(AppEvent::DatasetLoaded {
        total_reviews: stats.total_reviews,
        unique_hospitals: stats.unique_hospitals,
    });
    *state.dataset.write().await = Some(dataset);
    // A new dataset invalidates previous analysis results.
    *state.results.write().await = None;
    stats
}

/// POST /upload — multipart CSV upload.
pub async fn upload(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut csv_bytes: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("malformed upload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let is_csv = field
            .file_name()
            .map(|name| name.to_lowercase().ends_with(".csv"))
            .unwrap_or(false);
        if !is_csv {
            return Err(ApiError::bad_request("invalid file type, please upload a CSV file"));
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("upload read failed: {e}")))?;
        csv_bytes = Some(bytes.to_vec());
    }

    let bytes = csv_bytes.ok_or_else(|| ApiError::bad_request("no file selected"))?;
    let dataset = Dataset::from_csv_bytes(&bytes)?;
    let stats = install_dataset(&state, dataset).await;

    info!(reviews = stats.total_reviews, hospitals = stats.unique_hospitals, "CSV uploaded");
    Ok(Json(UploadResponse { success: true, stats, sample_loaded: None }))
}

async fn read_sample(state: &SharedState) -> Result<Dataset, ApiError> {
    let bytes = tokio::fs::read(&state.sample_data)
        .await
        .map_err(|_| ApiError::not_found("sample data file not found"))?;
    Ok(Dataset::from_csv_bytes(&bytes)?)
}

/// POST /load_sample — load the bundled sample server-side.
pub async fn load_sample(
    State(state): State<SharedState>,
) -> Result<Json<UploadResponse>, ApiError> {
    let dataset = read_sample(&state).await?;
    let stats = install_dataset(&state, dataset).await;
    info!(reviews = stats.total_reviews, "Sample data loaded");
    Ok(Json(UploadResponse { success: true, stats, sample_loaded: Some(true) }))
}

/// GET /load_sample_data — load the sample and hand the rows to the
/// frontend (it sends them back with `/analyze`).
pub async fn load_sample_data(
    State(state): State<SharedState>,
) -> Result<Json<SampleDataResponse>, ApiError> {
    let dataset = read_sample(&state).await?;
    let records = dataset.records.clone();
    let stats = install_dataset(&state, dataset).await;

    Ok(Json(SampleDataResponse {
        success: true,
        message: format!("loaded sample data ({} reviews)", stats.total_reviews),
        data: records,
    }))
}

/// GET /download_sample — the sample CSV as an attachment.
pub async fn download_sample(
    State(state): State<SharedState>,
) -> Result<impl IntoResponse, ApiError> {
    let bytes = tokio::fs::read(&state.sample_data)
        .await
        .map_err(|_| ApiError::not_found("sample data file not found"))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"sample_data.csv\""),
        ],
        bytes,
    ))
}
