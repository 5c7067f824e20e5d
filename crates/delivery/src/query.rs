//! The shared delivery read.
//!
//! Both transports answer one question against the store: "what exists for
//! this user past this watermark?" Keeping that in a single place is what
//! guarantees a long-poll client and a stream client with the same
//! watermark observe the same messages.

use serde::Serialize;
use sqlx::SqlitePool;

use message_store::message;
use message_store::models::Message;

use crate::error::DeliveryError;

/// A batch of delivered messages, ascending by id. The client's next
/// watermark is the id of the last element.
#[derive(Debug, Clone, Serialize)]
pub struct MessageBatch {
    pub messages: Vec<Message>,
}

impl MessageBatch {
    /// The empty batch a timed-out long poll returns.
    pub fn empty() -> Self {
        Self {
            messages: Vec::new(),
        }
    }
}

/// Messages involving `user_id` newer than `watermark`, ascending.
pub async fn deliverable(
    pool: &SqlitePool,
    user_id: i64,
    watermark: i64,
) -> Result<Vec<Message>, DeliveryError> {
    Ok(message::new_since(pool, user_id, watermark).await?)
}

/// Resolve the watermark a client supplied, if any.
///
/// A client connecting without one starts at the current high watermark:
/// it waits for new activity instead of replaying its entire history.
pub async fn resolve_watermark(
    pool: &SqlitePool,
    supplied: Option<i64>,
) -> Result<i64, DeliveryError> {
    match supplied {
        Some(watermark) => Ok(watermark),
        None => Ok(message::latest_id(pool).await?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use message_store::models::NewMessage;
    use message_store::Store;

    async fn test_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}?mode=rwc", dir.path().join("parley.db").display());
        let store = Store::connect(&url).await.unwrap();
        store.migrate().await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_deliverable_respects_watermark() {
        let (_dir, store) = test_store().await;
        let pool = store.pool();

        let first = message::append(pool, &NewMessage::text(1, 2, "one")).await.unwrap();
        let second = message::append(pool, &NewMessage::text(1, 2, "two")).await.unwrap();

        let batch = deliverable(pool, 2, first.id).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].id, second.id);

        assert!(deliverable(pool, 2, second.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_watermark() {
        let (_dir, store) = test_store().await;
        let pool = store.pool();

        // Empty store: start from zero
        assert_eq!(resolve_watermark(pool, None).await.unwrap(), 0);

        // A supplied watermark is used as-is
        assert_eq!(resolve_watermark(pool, Some(7)).await.unwrap(), 7);

        // No watermark resolves to the newest id, so a fresh connection
        // sees nothing until something new arrives
        let sent = message::append(pool, &NewMessage::text(1, 2, "hi")).await.unwrap();
        let resolved = resolve_watermark(pool, None).await.unwrap();
        assert_eq!(resolved, sent.id);
        assert!(deliverable(pool, 2, resolved).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_batch_serializes_as_message_list() {
        let (_dir, store) = test_store().await;
        let pool = store.pool();

        message::append(pool, &NewMessage::text(1, 2, "hi")).await.unwrap();
        let batch = MessageBatch {
            messages: deliverable(pool, 2, 0).await.unwrap(),
        };

        let value = serde_json::to_value(&batch).unwrap();
        let messages = value["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["message_text"], "hi");
    }
}
