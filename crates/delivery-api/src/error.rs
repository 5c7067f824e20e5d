//! Error types for the delivery API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use delivery::DeliveryError;
use message_store::StoreError;

/// Errors surfaced to HTTP callers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No usable caller identity on the request.
    #[error("Unauthorized")]
    Unauthorized,

    /// Malformed payload or query parameter.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Requested record does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller may not perform the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, self.to_string()),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                // The cause stays in the log, not on the wire
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} {}", entity, id))
            }
            StoreError::PermissionDenied { entity, id } => {
                ApiError::Forbidden(format!("cannot modify {} {}", entity, id))
            }
            StoreError::Validation(err) => ApiError::Validation(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<DeliveryError> for ApiError {
    fn from(err: DeliveryError) -> Self {
        match err {
            DeliveryError::Store(err) => ApiError::from(err),
        }
    }
}

/// Result type for API handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use message_store::ValidationError;

    #[test]
    fn test_store_errors_map_to_statuses() {
        let not_found = ApiError::from(StoreError::NotFound {
            entity: "Message",
            id: "7".to_string(),
        });
        assert!(matches!(not_found, ApiError::NotFound(_)));

        let denied = ApiError::from(StoreError::PermissionDenied {
            entity: "Message",
            id: "7".to_string(),
        });
        assert!(matches!(denied, ApiError::Forbidden(_)));

        let invalid = ApiError::from(StoreError::Validation(ValidationError::EmptyMessage));
        assert!(matches!(invalid, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_internal_detail_stays_off_the_wire() {
        let response = ApiError::Internal("pool exhausted".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Internal error");
    }
}
