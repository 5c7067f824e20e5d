//! Server-driven event stream.
//!
//! One task per open connection runs the same delivery query as the long
//! poll, on a shorter cadence, pushing batches into a channel as they
//! appear. The task owns its watermark and advances it past every batch it
//! delivers, so a connection never re-sends a message it already pushed.

use std::time::Instant;

use chrono::Utc;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use tokio::sync::mpsc;
use tokio::time::interval;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use message_store::models::PresenceStatus;
use message_store::presence;

use crate::config::DeliveryConfig;
use crate::query::{self, MessageBatch};

/// Events pushed over one stream connection.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// First event after the connection opens.
    Connected { user_id: i64, timestamp: String },
    /// A non-empty batch of newly deliverable messages.
    Message { batch: MessageBatch },
    /// Periodic liveness signal so idle connections are distinguishable
    /// from dead ones.
    Heartbeat { timestamp: String },
    /// The connection reached its maximum lifetime; the client should
    /// reconnect with its current watermark.
    Timeout { message: String },
    /// A query failed. The stream stays open and the next tick retries.
    Error { error: String, message: String },
    /// Terminal event on every exit path.
    Disconnected { message: String },
}

impl StreamEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::Connected { .. } => "connected",
            StreamEvent::Message { .. } => "message",
            StreamEvent::Heartbeat { .. } => "heartbeat",
            StreamEvent::Timeout { .. } => "timeout",
            StreamEvent::Error { .. } => "error",
            StreamEvent::Disconnected { .. } => "disconnected",
        }
    }

    /// JSON payload of the event.
    pub fn data(&self) -> Value {
        match self {
            StreamEvent::Connected { user_id, timestamp } => json!({
                "user_id": user_id,
                "timestamp": timestamp,
            }),
            StreamEvent::Message { batch } => json!({
                "messages": batch.messages,
            }),
            StreamEvent::Heartbeat { timestamp } => json!({
                "timestamp": timestamp,
            }),
            StreamEvent::Timeout { message } => json!({
                "message": message,
            }),
            StreamEvent::Error { error, message } => json!({
                "error": error,
                "message": message,
            }),
            StreamEvent::Disconnected { message } => json!({
                "message": message,
            }),
        }
    }
}

/// Open an event stream for `user_id` starting after `watermark`.
///
/// Spawns the per-connection poll task and hands back its receiving end.
/// Dropping the stream is how the caller disconnects; the task notices the
/// closed channel on its next tick and stops.
pub fn message_events(
    pool: SqlitePool,
    user_id: i64,
    watermark: i64,
    config: DeliveryConfig,
) -> ReceiverStream<StreamEvent> {
    let (tx, rx) = mpsc::channel(16);

    tokio::spawn(stream_loop(pool, user_id, watermark, config, tx));

    ReceiverStream::new(rx)
}

async fn stream_loop(
    pool: SqlitePool,
    user_id: i64,
    mut watermark: i64,
    config: DeliveryConfig,
    tx: mpsc::Sender<StreamEvent>,
) {
    let started = Instant::now();
    let mut last_heartbeat = Instant::now();
    let mut ticker = interval(config.stream_interval);

    let connected = StreamEvent::Connected {
        user_id,
        timestamp: Utc::now().to_rfc3339(),
    };
    if tx.send(connected).await.is_err() {
        return;
    }

    loop {
        ticker.tick().await;

        // A vanished client is observed here, one tick late at worst.
        if tx.is_closed() {
            debug!(user_id = user_id, "stream receiver dropped, stopping");
            break;
        }

        if started.elapsed() >= config.max_stream_lifetime {
            let timeout = StreamEvent::Timeout {
                message: "connection lifetime reached, reconnect to resume".to_string(),
            };
            let _ = tx.send(timeout).await;
            break;
        }

        match query::deliverable(&pool, user_id, watermark).await {
            Ok(messages) if !messages.is_empty() => {
                if let Some(last) = messages.last() {
                    watermark = last.id;
                }
                let event = StreamEvent::Message {
                    batch: MessageBatch { messages },
                };
                if tx.send(event).await.is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(err) => {
                warn!(user_id = user_id, error = %err, "delivery query failed, stream stays open");
                let event = StreamEvent::Error {
                    error: "delivery_query_failed".to_string(),
                    message: err.to_string(),
                };
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        }

        if last_heartbeat.elapsed() >= config.heartbeat_interval {
            let heartbeat = StreamEvent::Heartbeat {
                timestamp: Utc::now().to_rfc3339(),
            };
            if tx.send(heartbeat).await.is_err() {
                break;
            }

            // An open stream counts as activity
            if let Err(err) = presence::touch(&pool, user_id, PresenceStatus::Online).await {
                warn!(user_id = user_id, error = %err, "presence refresh failed");
            }
            last_heartbeat = Instant::now();
        }
    }

    let goodbye = StreamEvent::Disconnected {
        message: "stream closed".to_string(),
    };
    let _ = tx.send(goodbye).await;
}
