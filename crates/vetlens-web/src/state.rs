//! Shared application state for the dashboard server.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};

use vetlens_analysis::{AnalysisResults, Dataset};
use vetlens_sentiment::ScorerSet;

use crate::config::ServerConfig;

/// Events pushed to connected clients via SSE.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// A dataset was uploaded or the sample was loaded
    DatasetLoaded { total_reviews: usize, unique_hospitals: usize },
    /// One model finished its scoring pass
    AnalysisProgress { model: String, completed: usize, total: usize },
    /// Analysis finished; charts are available
    AnalysisComplete { hospitals: usize },
    /// General system notification
    Notification { level: String, message: String },
}

/// Shared state injected into every Axum handler. The dashboard is
/// single-tenant: one dataset and one result set at a time.
pub struct AppState {
    pub scorers: ScorerSet,
    pub dataset: RwLock<Option<Dataset>>,
    pub results: RwLock<Option<AnalysisResults>>,
    pub sample_data: PathBuf,
    pub bootstrap_iterations: usize,
    /// Broadcast channel for SSE push events
    pub event_tx: broadcast::Sender<AppEvent>,
}

impl AppState {
    pub fn new(scorers: ScorerSet, config: &ServerConfig) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            scorers,
            dataset: RwLock::new(None),
            results: RwLock::new(None),
            sample_data: config.sample_data.clone(),
            bootstrap_iterations: config.bootstrap_iterations,
            event_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.event_tx.subscribe()
    }

    /// Fire-and-forget event publish; nobody listening is fine.
    pub fn publish(&self, event: AppEvent) {
        let _ = self.event_tx.send(event);
    }
}

pub type SharedState = Arc<AppState>;
