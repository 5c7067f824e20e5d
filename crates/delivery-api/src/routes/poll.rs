//! Bounded long-poll transport.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::debug;

use delivery::{resolve_watermark, wait_for_messages, MessageBatch, PollOutcome};
use message_store::models::PresenceStatus;
use message_store::presence;

use crate::error::Result;
use crate::identity::CallerIdentity;
use crate::state::AppState;

/// Long-poll query parameters.
#[derive(Debug, Deserialize)]
pub struct PollParams {
    /// Highest message id the client has already seen. Omitted on a fresh
    /// client; the server then waits for new activity only.
    pub last_message_id: Option<i64>,
}

/// Hold the request open until new messages exist or the wait bound
/// elapses. Timing out is the normal idle case and returns an empty batch
/// with 200, not an error. If the client vanishes mid-wait, axum drops
/// this future at the next await point and nothing is written.
pub async fn poll(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Query(params): Query<PollParams>,
) -> Result<Json<MessageBatch>> {
    let hold = state.sessions.acquire(&identity.session_id).await;
    presence::touch(state.store.pool(), identity.user_id, PresenceStatus::Online).await?;
    let watermark = resolve_watermark(state.store.pool(), params.last_message_id).await?;

    // Parking with the hold would stall the session's other requests for
    // the whole wait.
    hold.release();

    match wait_for_messages(state.store.pool(), identity.user_id, watermark, &state.delivery).await
    {
        PollOutcome::Delivered(messages) => {
            debug!(
                user_id = identity.user_id,
                count = messages.len(),
                "long-poll delivered"
            );
            Ok(Json(MessageBatch { messages }))
        }
        PollOutcome::TimedOut => Ok(Json(MessageBatch::empty())),
    }
}
