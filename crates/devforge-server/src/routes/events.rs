use std::convert::Infallible;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;

use crate::state::AppState;

#[derive(serde::Deserialize)]
pub struct EventsQuery {
    /// Only stream entries for this project.
    #[serde(default)]
    pub project: Option<String>,
}

/// GET /api/events: SSE stream of `activity` events, one per log entry.
pub async fn sse_events(
    State(app): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> impl axum::response::IntoResponse {
    let rx = app.event_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |msg| {
        let event = msg.ok()?;
        if query
            .project
            .as_deref()
            .is_some_and(|id| id != event.project_id)
        {
            return None;
        }
        Event::default()
            .event("activity")
            .json_data(&event)
            .ok()
            .map(Ok::<Event, Infallible>)
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
