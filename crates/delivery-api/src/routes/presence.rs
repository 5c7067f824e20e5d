//! Presence handlers.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use message_store::models::PresenceStatus;
use message_store::presence::{self, STALENESS_THRESHOLD_SECS};

use crate::error::Result;
use crate::identity::CallerIdentity;
use crate::state::AppState;

/// Presence as reported to callers, staleness already applied.
#[derive(Debug, Serialize)]
pub struct PresenceResponse {
    pub user_id: i64,
    pub status: PresenceStatus,
    /// Unix seconds of last activity; absent for never-seen users.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<i64>,
}

/// Explicit status change: `away` from an idle client, `offline` from the
/// auth layer's logout hook.
#[derive(Debug, Deserialize)]
pub struct SetPresenceRequest {
    pub status: PresenceStatus,
}

/// Report a user's presence. A user whose last activity is older than the
/// staleness threshold reads as offline whatever their row says, because
/// polling clients never say goodbye.
pub async fn get_presence(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Path(user_id): Path<i64>,
) -> Result<Json<PresenceResponse>> {
    let _hold = state.sessions.acquire(&identity.session_id).await;
    presence::touch(state.store.pool(), identity.user_id, PresenceStatus::Online).await?;

    let response = match presence::get(state.store.pool(), user_id).await? {
        Some(record) => PresenceResponse {
            user_id,
            status: record.effective_status(unix_timestamp(), STALENESS_THRESHOLD_SECS),
            last_seen: Some(record.last_seen),
        },
        None => PresenceResponse {
            user_id,
            status: PresenceStatus::Offline,
            last_seen: None,
        },
    };

    Ok(Json(response))
}

/// Set the caller's own status. This is the one request that records
/// something other than `online` for its caller.
pub async fn set_presence(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Json(req): Json<SetPresenceRequest>,
) -> Result<Json<PresenceResponse>> {
    let _hold = state.sessions.acquire(&identity.session_id).await;
    presence::touch(state.store.pool(), identity.user_id, req.status).await?;

    Ok(Json(PresenceResponse {
        user_id: identity.user_id,
        status: req.status,
        last_seen: Some(unix_timestamp()),
    }))
}

fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
