//! Server-Sent Events: pushes dataset and analysis progress to the page.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_core::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::state::{AppEvent, SharedState};

/// SSE event name per variant, so the page registers one listener per
/// concern instead of switching on the payload's type field.
fn event_name(event: &AppEvent) -> &'static str {
    match event {
        AppEvent::DatasetLoaded { .. } => "dataset_loaded",
        AppEvent::AnalysisProgress { .. } => "analysis_progress",
        AppEvent::AnalysisComplete { .. } => "analysis_complete",
        AppEvent::Notification { .. } => "notification",
    }
}

/// GET /api/events. Receivers that lag behind the broadcast buffer
/// just miss events; progress updates are advisory, not state.
pub async fn sse_handler(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|received| {
        let event = received.ok()?;
        let data = serde_json::to_string(&event).ok()?;
        Some(Ok(Event::default().event(event_name(&event)).data(data)))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
