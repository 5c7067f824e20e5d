//! Message append, lookup, and delivery reads.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::models::{Message, NewMessage};
use crate::now_epoch;
use crate::validation::validate_new_message;

/// Window during which an identical repeat send is folded into the
/// original row instead of inserting a new one. Client retry-on-timeout
/// and double-submit both land here as repeat sends.
pub const DEDUP_WINDOW_SECS: i64 = 5;

/// Append a message and return the stored row.
///
/// An identical payload (same sender, recipient, text, and attachment URL)
/// appended within [`DEDUP_WINDOW_SECS`] returns the original message. The
/// check is read-then-insert, so two simultaneous sends can still both
/// land; the window is about client retries, not a uniqueness guarantee.
pub async fn append(pool: &SqlitePool, new: &NewMessage) -> Result<Message> {
    append_at(pool, new, now_epoch(), DEDUP_WINDOW_SECS).await
}

pub(crate) async fn append_at(
    pool: &SqlitePool,
    new: &NewMessage,
    now: i64,
    dedup_window_secs: i64,
) -> Result<Message> {
    validate_new_message(new)?;

    let duplicate = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT id
        FROM messages
        WHERE sender_id = ?
          AND recipient_id = ?
          AND COALESCE(message_text, '') = COALESCE(?, '')
          AND COALESCE(attachment_url, '') = COALESCE(?, '')
          AND created_at > ?
        ORDER BY id DESC
        LIMIT 1
        "#,
    )
    .bind(new.sender_id)
    .bind(new.recipient_id)
    .bind(&new.message_text)
    .bind(&new.attachment_url)
    .bind(now - dedup_window_secs)
    .fetch_optional(pool)
    .await?;

    if let Some(id) = duplicate {
        debug!(
            message_id = id,
            sender_id = new.sender_id,
            "suppressed duplicate send"
        );
        return by_id(pool, id).await;
    }

    let result = sqlx::query(
        r#"
        INSERT INTO messages
            (sender_id, recipient_id, message_text, attachment_type,
             attachment_url, attachment_name, attachment_size, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(new.sender_id)
    .bind(new.recipient_id)
    .bind(&new.message_text)
    .bind(new.attachment_type)
    .bind(&new.attachment_url)
    .bind(&new.attachment_name)
    .bind(new.attachment_size)
    .bind(now)
    .execute(pool)
    .await?;

    by_id(pool, result.last_insert_rowid()).await
}

/// Get a message by id.
pub async fn by_id(pool: &SqlitePool, id: i64) -> Result<Message> {
    let message = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, sender_id, recipient_id, message_text, attachment_type,
               attachment_url, attachment_name, attachment_size, created_at,
               is_read, read_at
        FROM messages
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    message.ok_or_else(|| StoreError::NotFound {
        entity: "Message",
        id: id.to_string(),
    })
}

/// One page of the conversation between `user_id` and `peer_id`, ascending
/// by id within the page. `offset` counts back from the newest message, so
/// offset 0 is the most recent page.
///
/// Fetching history counts as seeing it: every message in this
/// conversation addressed to `user_id` is marked read, not just the page.
pub async fn conversation(
    pool: &SqlitePool,
    user_id: i64,
    peer_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<Message>> {
    let mut messages = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, sender_id, recipient_id, message_text, attachment_type,
               attachment_url, attachment_name, attachment_size, created_at,
               is_read, read_at
        FROM messages
        WHERE (sender_id = ? AND recipient_id = ?)
           OR (sender_id = ? AND recipient_id = ?)
        ORDER BY id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(user_id)
    .bind(peer_id)
    .bind(peer_id)
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    messages.reverse();

    sqlx::query(
        r#"
        UPDATE messages
        SET is_read = 1, read_at = ?
        WHERE recipient_id = ? AND sender_id = ? AND is_read = 0
        "#,
    )
    .bind(now_epoch())
    .bind(user_id)
    .bind(peer_id)
    .execute(pool)
    .await?;

    Ok(messages)
}

/// All messages involving `user_id` with id greater than `watermark`,
/// ascending by id. This is the read both delivery transports share: a
/// client that feeds each batch's last id back as its next watermark sees
/// every message exactly once, in order.
///
/// Returned messages addressed to `user_id` are marked read, bounded above
/// by the last returned id so a row appended mid-call is never marked
/// before anyone has been handed it.
pub async fn new_since(pool: &SqlitePool, user_id: i64, watermark: i64) -> Result<Vec<Message>> {
    let messages = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, sender_id, recipient_id, message_text, attachment_type,
               attachment_url, attachment_name, attachment_size, created_at,
               is_read, read_at
        FROM messages
        WHERE (sender_id = ? OR recipient_id = ?)
          AND id > ?
        ORDER BY id ASC
        "#,
    )
    .bind(user_id)
    .bind(user_id)
    .bind(watermark)
    .fetch_all(pool)
    .await?;

    if let Some(last) = messages.last() {
        sqlx::query(
            r#"
            UPDATE messages
            SET is_read = 1, read_at = ?
            WHERE recipient_id = ? AND id > ? AND id <= ? AND is_read = 0
            "#,
        )
        .bind(now_epoch())
        .bind(user_id)
        .bind(watermark)
        .bind(last.id)
        .execute(pool)
        .await?;
    }

    Ok(messages)
}

/// Hard-delete a message. Only its sender or an admin may delete; the row
/// is gone afterwards, there is no tombstone.
pub async fn delete(pool: &SqlitePool, id: i64, requester_id: i64, is_admin: bool) -> Result<()> {
    let message = by_id(pool, id).await?;

    if message.sender_id != requester_id && !is_admin {
        return Err(StoreError::PermissionDenied {
            entity: "Message",
            id: id.to_string(),
        });
    }

    sqlx::query("DELETE FROM messages WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Highest assigned message id, 0 when the table is empty. Deleted rows
/// never lower it (AUTOINCREMENT ids are not reused), so it is safe as the
/// starting watermark for a client with no history.
pub async fn latest_id(pool: &SqlitePool) -> Result<i64> {
    let id = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT seq
        FROM sqlite_sequence
        WHERE name = 'messages'
        "#,
    )
    .fetch_optional(pool)
    .await?;

    Ok(id.unwrap_or(0))
}

/// Count of unread messages addressed to `user_id`.
pub async fn unread_count(pool: &SqlitePool, user_id: i64) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM messages
        WHERE recipient_id = ? AND is_read = 0
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// Count of all stored messages.
pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM messages")
        .fetch_one(pool)
        .await?;

    Ok(count)
}
