//! Axum router — maps all URL paths to handlers.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};

use crate::handlers::{
    analyze::analyze,
    charts::{get_charts, get_performance_metrics},
    dashboard::dashboard,
    export::export_results,
    stats_test::statistical_test,
    upload::{download_sample, load_sample, load_sample_data, upload},
};
use crate::sse::sse_handler;
use crate::state::SharedState;

/// Upload cap for CSV files.
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Build and return the full Axum router.
pub fn build_router(state: SharedState, static_dir: &std::path::Path) -> Router {
    Router::new()
        // Pages
        .route("/", get(dashboard))

        // Dataset in
        .route("/upload", post(upload))
        .route("/load_sample", post(load_sample))
        .route("/load_sample_data", get(load_sample_data))
        .route("/download_sample", get(download_sample))

        // Analysis
        .route("/analyze", post(analyze))
        .route("/get_charts", get(get_charts))
        .route("/get_performance_metrics", get(get_performance_metrics))
        .route("/statistical_test", post(statistical_test))
        .route("/export_results", get(export_results))

        // SSE streaming
        .route("/api/events", get(sse_handler))

        // Static files
        .nest_service("/static", ServeDir::new(static_dir))

        // Middleware
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
