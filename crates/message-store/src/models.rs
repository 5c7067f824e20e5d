//! Store models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Kind of attachment carried by a message.
///
/// Stored as lowercase text; `none` marks a text-only message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AttachmentType {
    /// Text-only message.
    #[default]
    None,
    Image,
    Video,
    File,
}

/// User presence status as stored. Staleness is applied at read time via
/// [`PresenceRecord::effective_status`], never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Away,
    Offline,
}

/// A direct message between two users.
///
/// Read-tracking fields stay server-side; they are bookkeeping for unread
/// counts, not part of the wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Message {
    /// Store-assigned id. Strictly increasing, never reused; delivery
    /// watermarks depend on both properties.
    pub id: i64,
    /// Sending user.
    pub sender_id: i64,
    /// Receiving user.
    pub recipient_id: i64,
    /// Message body, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_text: Option<String>,
    /// Attachment kind (`none` for text-only messages).
    pub attachment_type: AttachmentType,
    /// Attachment location, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
    /// Attachment display name, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_name: Option<String>,
    /// Attachment size in bytes, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment_size: Option<i64>,
    /// Creation time, unix seconds.
    pub created_at: i64,
    /// Whether the recipient has been handed this message.
    #[serde(skip)]
    pub is_read: bool,
    /// When the recipient was handed it, unix seconds.
    #[serde(skip)]
    pub read_at: Option<i64>,
}

/// Payload for appending a new message.
#[derive(Debug, Clone, Default)]
pub struct NewMessage {
    /// Sending user.
    pub sender_id: i64,
    /// Receiving user.
    pub recipient_id: i64,
    /// Message body.
    pub message_text: Option<String>,
    /// Attachment kind.
    pub attachment_type: AttachmentType,
    /// Attachment location.
    pub attachment_url: Option<String>,
    /// Attachment display name.
    pub attachment_name: Option<String>,
    /// Attachment size in bytes.
    pub attachment_size: Option<i64>,
}

impl NewMessage {
    /// Text-only message, the common case.
    pub fn text(sender_id: i64, recipient_id: i64, text: impl Into<String>) -> Self {
        Self {
            sender_id,
            recipient_id,
            message_text: Some(text.into()),
            ..Self::default()
        }
    }
}

/// Stored presence for one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct PresenceRecord {
    /// The user this record describes.
    pub user_id: i64,
    /// Last explicitly recorded status.
    pub status: PresenceStatus,
    /// Last authenticated activity, unix seconds.
    pub last_seen: i64,
}

impl PresenceRecord {
    /// Status to report at `now`: a record older than `threshold_secs`
    /// reads as offline no matter what the stored column says, because
    /// stateless clients give no disconnect signal.
    pub fn effective_status(&self, now: i64, threshold_secs: i64) -> PresenceStatus {
        if now - self.last_seen > threshold_secs {
            PresenceStatus::Offline
        } else {
            self.status
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_wire_shape_hides_read_tracking() {
        let message = Message {
            id: 7,
            sender_id: 1,
            recipient_id: 2,
            message_text: Some("hello".to_string()),
            attachment_type: AttachmentType::None,
            attachment_url: None,
            attachment_name: None,
            attachment_size: None,
            created_at: 1_700_000_000,
            is_read: true,
            read_at: Some(1_700_000_005),
        };

        let value = serde_json::to_value(&message).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object["id"], 7);
        assert_eq!(object["attachment_type"], "none");
        assert!(!object.contains_key("is_read"));
        assert!(!object.contains_key("read_at"));
        assert!(!object.contains_key("attachment_url"));
    }

    #[test]
    fn test_statuses_serialize_lowercase() {
        assert_eq!(
            serde_json::to_value(PresenceStatus::Online).unwrap(),
            serde_json::json!("online")
        );
        assert_eq!(
            serde_json::to_value(AttachmentType::Image).unwrap(),
            serde_json::json!("image")
        );
    }

    #[test]
    fn test_stale_presence_reads_offline() {
        let record = PresenceRecord {
            user_id: 1,
            status: PresenceStatus::Online,
            last_seen: 1_000_000,
        };

        assert_eq!(
            record.effective_status(1_000_000 + 10, 300),
            PresenceStatus::Online
        );
        // Exactly at the threshold still counts as fresh.
        assert_eq!(
            record.effective_status(1_000_000 + 300, 300),
            PresenceStatus::Online
        );
        assert_eq!(
            record.effective_status(1_000_000 + 301, 300),
            PresenceStatus::Offline
        );
    }

    #[test]
    fn test_explicit_offline_wins_even_when_fresh() {
        let record = PresenceRecord {
            user_id: 1,
            status: PresenceStatus::Offline,
            last_seen: 1_000_000,
        };

        assert_eq!(
            record.effective_status(1_000_000 + 1, 300),
            PresenceStatus::Offline
        );
    }
}
