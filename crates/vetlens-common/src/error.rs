use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VetlensError {
    #[error("CSV error: {0}")]
    Csv(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No dataset uploaded yet")]
    NoDataset,

    #[error("No analysis results available yet")]
    NoResults,

    #[error("Sentiment scoring failed: {0}")]
    Scoring(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, VetlensError>;

/// Error surfaced to the browser as `{"success": false, "error": "..."}`,
/// the only error shape the frontend understands.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self { status: StatusCode::NOT_FOUND, message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: message.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "success": false, "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<VetlensError> for ApiError {
    fn from(err: VetlensError) -> Self {
        match err {
            VetlensError::NoDataset | VetlensError::NoResults => ApiError::bad_request(err.to_string()),
            VetlensError::InvalidInput(_) | VetlensError::Csv(_) => ApiError::bad_request(err.to_string()),
            other => ApiError::internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_errors_map_to_400() {
        let api: ApiError = VetlensError::NoDataset.into();
        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert!(api.message.contains("dataset"));
    }

    #[test]
    fn opaque_errors_map_to_500() {
        let api: ApiError = VetlensError::Scoring("device lost".into()).into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
