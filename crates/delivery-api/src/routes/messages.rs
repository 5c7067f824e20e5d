//! Message send, history, fetch, and moderation handlers.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use delivery::MessageBatch;
use message_store::models::{AttachmentType, Message, NewMessage, PresenceStatus};
use message_store::{message, presence};

use crate::error::{ApiError, Result};
use crate::identity::CallerIdentity;
use crate::state::AppState;

/// Default conversation page size.
const DEFAULT_PAGE_SIZE: i64 = 50;
/// Largest page a client may request.
const MAX_PAGE_SIZE: i64 = 200;

/// Body of a send request. The sender is the authenticated caller, never a
/// payload field.
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub recipient_id: i64,
    #[serde(default)]
    pub message_text: Option<String>,
    #[serde(default)]
    pub attachment_type: AttachmentType,
    #[serde(default)]
    pub attachment_url: Option<String>,
    #[serde(default)]
    pub attachment_name: Option<String>,
    #[serde(default)]
    pub attachment_size: Option<i64>,
}

/// Window onto a conversation.
#[derive(Debug, Deserialize)]
pub struct ConversationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Send a message. A retry of the same payload within the suppression
/// window returns the already-stored message, so clients that resend on a
/// flaky connection do not double-deliver.
pub async fn send(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Json(req): Json<SendRequest>,
) -> Result<Json<Message>> {
    let _hold = state.sessions.acquire(&identity.session_id).await;
    presence::touch(state.store.pool(), identity.user_id, PresenceStatus::Online).await?;

    let new = NewMessage {
        sender_id: identity.user_id,
        recipient_id: req.recipient_id,
        message_text: req.message_text,
        attachment_type: req.attachment_type,
        attachment_url: req.attachment_url,
        attachment_name: req.attachment_name,
        attachment_size: req.attachment_size,
    };

    let sent = message::append(state.store.pool(), &new).await?;
    info!(
        message_id = sent.id,
        sender_id = sent.sender_id,
        recipient_id = sent.recipient_id,
        "message accepted"
    );

    Ok(Json(sent))
}

/// One ascending page of the conversation with `peer_id`. Fetching history
/// marks the peer's messages to the caller as read.
pub async fn conversation(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Path(peer_id): Path<i64>,
    Query(params): Query<ConversationParams>,
) -> Result<Json<MessageBatch>> {
    let _hold = state.sessions.acquire(&identity.session_id).await;
    presence::touch(state.store.pool(), identity.user_id, PresenceStatus::Online).await?;

    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0).max(0);

    let messages =
        message::conversation(state.store.pool(), identity.user_id, peer_id, limit, offset)
            .await?;

    Ok(Json(MessageBatch { messages }))
}

/// Fetch a single message. Participants and admins only; everyone else
/// gets the same 404 a missing id would give, so ids cannot be probed.
pub async fn fetch(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Path(id): Path<i64>,
) -> Result<Json<Message>> {
    let _hold = state.sessions.acquire(&identity.session_id).await;
    presence::touch(state.store.pool(), identity.user_id, PresenceStatus::Online).await?;

    let found = message::by_id(state.store.pool(), id).await?;
    let participant =
        found.sender_id == identity.user_id || found.recipient_id == identity.user_id;
    if !participant && !identity.is_admin {
        return Err(ApiError::NotFound(format!("Message {}", id)));
    }

    Ok(Json(found))
}

/// Delete a message. Senders may delete their own; admins may delete any.
pub async fn remove(
    State(state): State<AppState>,
    identity: CallerIdentity,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>> {
    let _hold = state.sessions.acquire(&identity.session_id).await;
    presence::touch(state.store.pool(), identity.user_id, PresenceStatus::Online).await?;

    message::delete(state.store.pool(), id, identity.user_id, identity.is_admin).await?;
    info!(
        message_id = id,
        requester_id = identity.user_id,
        "message deleted"
    );

    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Unread message count for the caller.
pub async fn unread(
    State(state): State<AppState>,
    identity: CallerIdentity,
) -> Result<Json<serde_json::Value>> {
    let _hold = state.sessions.acquire(&identity.session_id).await;
    presence::touch(state.store.pool(), identity.user_id, PresenceStatus::Online).await?;

    let unread = message::unread_count(state.store.pool(), identity.user_id).await?;

    Ok(Json(serde_json::json!({ "unread": unread })))
}
