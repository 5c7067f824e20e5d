//! Event-stream transport.

use std::convert::Infallible;

use axum::extract::{Query, State};
use axum::response::sse::{Event, Sse};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tokio_stream::StreamExt;
use tracing::debug;

use delivery::{message_events, resolve_watermark};
use message_store::models::PresenceStatus;
use message_store::presence;

use crate::error::Result;
use crate::identity::CallerIdentity;
use crate::state::AppState;

/// Stream query parameters.
#[derive(Debug, Deserialize)]
pub struct StreamParams {
    /// Highest message id the client has already seen. Omitted on a fresh
    /// client; the stream then carries new activity only.
    pub last_message_id: Option<i64>,
}

/// Open a server-driven event stream: `connected` first, then `message`,
/// `heartbeat`, and `error` events as they happen, `timeout` at the
/// lifetime cap, and `disconnected` as the terminal event on every path.
pub async fn stream(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Query(params): Query<StreamParams>,
) -> Result<Response> {
    let hold = state.sessions.acquire(&identity.session_id).await;
    presence::touch(state.store.pool(), identity.user_id, PresenceStatus::Online).await?;
    let watermark = resolve_watermark(state.store.pool(), params.last_message_id).await?;

    // Same rule as the long poll: an open stream must not hold the
    // session while it waits.
    hold.release();

    debug!(
        user_id = identity.user_id,
        watermark = watermark,
        "stream opened"
    );

    let events = message_events(
        state.store.pool().clone(),
        identity.user_id,
        watermark,
        state.delivery.clone(),
    )
    .map(|event| {
        Ok::<_, Infallible>(
            Event::default()
                .event(event.name())
                .data(event.data().to_string()),
        )
    });

    // Proxies must pass events through as they are written
    let response = (
        [("x-accel-buffering", "no")],
        Sse::new(events),
    )
        .into_response();

    Ok(response)
}
