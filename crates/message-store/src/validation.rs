//! Input validation for message payloads.

use std::fmt;

use crate::models::{AttachmentType, NewMessage};

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Neither text nor attachment present.
    EmptyMessage,
    /// Recipient id is not a plausible user id.
    InvalidRecipient(i64),
    /// Attachment fields are inconsistent.
    InvalidAttachment(String),
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptyMessage => {
                write!(f, "message needs text or an attachment")
            }
            ValidationError::InvalidRecipient(id) => {
                write!(f, "invalid recipient id: {}", id)
            }
            ValidationError::InvalidAttachment(msg) => {
                write!(f, "invalid attachment: {}", msg)
            }
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for message text.
pub const MAX_TEXT_LENGTH: usize = 4000;

/// Maximum allowed length for attachment URLs.
pub const MAX_URL_LENGTH: usize = 2048;

/// Maximum allowed length for attachment display names.
pub const MAX_NAME_LENGTH: usize = 255;

/// Validate a message payload before it is appended.
///
/// A message must carry text, an attachment, or both. Whitespace-only text
/// counts as missing. Attachment type and URL must be set together.
pub fn validate_new_message(new: &NewMessage) -> Result<(), ValidationError> {
    if new.recipient_id <= 0 {
        return Err(ValidationError::InvalidRecipient(new.recipient_id));
    }

    let text = new.message_text.as_deref().map(str::trim).unwrap_or("");
    let url = new.attachment_url.as_deref().map(str::trim).unwrap_or("");

    if text.is_empty() && url.is_empty() {
        return Err(ValidationError::EmptyMessage);
    }

    if text.len() > MAX_TEXT_LENGTH {
        return Err(ValidationError::TooLong {
            field: "message_text".to_string(),
            max: MAX_TEXT_LENGTH,
            actual: text.len(),
        });
    }

    if url.is_empty() {
        if new.attachment_type != AttachmentType::None {
            return Err(ValidationError::InvalidAttachment(
                "attachment_type set without attachment_url".to_string(),
            ));
        }
    } else {
        if new.attachment_type == AttachmentType::None {
            return Err(ValidationError::InvalidAttachment(
                "attachment_url needs an attachment_type".to_string(),
            ));
        }

        if url.len() > MAX_URL_LENGTH {
            return Err(ValidationError::TooLong {
                field: "attachment_url".to_string(),
                max: MAX_URL_LENGTH,
                actual: url.len(),
            });
        }
    }

    if let Some(name) = new.attachment_name.as_deref() {
        if name.len() > MAX_NAME_LENGTH {
            return Err(ValidationError::TooLong {
                field: "attachment_name".to_string(),
                max: MAX_NAME_LENGTH,
                actual: name.len(),
            });
        }
    }

    if let Some(size) = new.attachment_size {
        if size < 0 {
            return Err(ValidationError::InvalidAttachment(
                "attachment_size cannot be negative".to_string(),
            ));
        }
    }

    Ok(())
}
