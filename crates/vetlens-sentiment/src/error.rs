//! Error types for the sentiment service.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SentimentError>;

#[derive(Error, Debug)]
pub enum SentimentError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Model download failed: {0}")]
    Download(String),

    #[error("Unsupported label layout: {0}")]
    Labels(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<candle_core::Error> for SentimentError {
    fn from(e: candle_core::Error) -> Self {
        SentimentError::Inference(e.to_string())
    }
}

impl From<tokenizers::Error> for SentimentError {
    fn from(e: tokenizers::Error) -> Self {
        SentimentError::Tokenizer(e.to_string())
    }
}

impl From<hf_hub::api::sync::ApiError> for SentimentError {
    fn from(e: hf_hub::api::sync::ApiError) -> Self {
        SentimentError::Download(e.to_string())
    }
}
