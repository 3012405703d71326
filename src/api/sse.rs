//! Server-Sent Events support

use crate::runtime::{SequencedUpdate, SessionUpdate};
use crate::session::SessionSnapshot;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Snapshot first, then every update the snapshot does not already include
pub fn sse_stream(
    init: SessionSnapshot,
    broadcast_rx: broadcast::Receiver<SequencedUpdate>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let last_sequence = init.sequence;
    let init_data = json!({ "type": "init", "data": init });
    let init = futures::stream::once(async move {
        Ok(Event::default()
            .event("init")
            .id(last_sequence.to_string())
            .data(init_data.to_string()))
    });

    let updates = updates_after(last_sequence, broadcast_rx).map(|u| Ok(update_to_event(&u)));

    Sse::new(init.chain(updates)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

/// Updates numbered above `sequence`, in order
fn updates_after(
    sequence: u64,
    broadcast_rx: broadcast::Receiver<SequencedUpdate>,
) -> impl Stream<Item = SequencedUpdate> {
    BroadcastStream::new(broadcast_rx).filter_map(move |result| match result {
        Ok(update) if update.sequence <= sequence => None,
        Ok(update) => Some(update),
        Err(e) => {
            // Lagged; the client can resync from GET /api/session
            tracing::warn!(error = %e, "SSE subscriber fell behind");
            None
        }
    })
}

fn update_to_event(update: &SequencedUpdate) -> Event {
    let data = serde_json::to_string(&update.update).unwrap_or_else(|e| {
        json!({ "type": "error", "data": e.to_string() }).to_string()
    });
    Event::default()
        .event(update.update.event_name())
        .id(update.sequence.to_string())
        .data(data)
}
