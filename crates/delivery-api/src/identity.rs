//! Caller identity resolved by the upstream auth layer.
//!
//! Session lookup and credential checks happen before requests reach this
//! service. The auth layer forwards its verdict in headers: `x-user-id`
//! and `x-session-id` are required, `x-user-admin` is optional. Anything
//! missing or malformed is a 401, never a crash.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;

/// An authenticated caller.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    /// User id the auth layer resolved.
    pub user_id: i64,
    /// Opaque session key. Requests sharing it are serialized.
    pub session_id: String,
    /// Whether the caller may moderate other users' messages.
    pub is_admin: bool,
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = header_str(parts, "x-user-id")
            .and_then(|raw| raw.parse::<i64>().ok())
            .filter(|id| *id > 0)
            .ok_or(ApiError::Unauthorized)?;

        let session_id = header_str(parts, "x-session-id")
            .filter(|raw| !raw.is_empty())
            .map(str::to_owned)
            .ok_or(ApiError::Unauthorized)?;

        let is_admin = header_str(parts, "x-user-admin")
            .map(|raw| raw == "1" || raw.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            user_id,
            session_id,
            is_admin,
        })
    }
}

fn header_str<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts.headers.get(name).and_then(|value| value.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<CallerIdentity, ApiError> {
        let (mut parts, _) = request.into_parts();
        CallerIdentity::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_accepts_forwarded_identity() {
        let request = Request::builder()
            .header("x-user-id", "42")
            .header("x-session-id", "sess-abc")
            .body(())
            .unwrap();

        let identity = extract(request).await.unwrap();
        assert_eq!(identity.user_id, 42);
        assert_eq!(identity.session_id, "sess-abc");
        assert!(!identity.is_admin);
    }

    #[tokio::test]
    async fn test_admin_flag_variants() {
        for value in ["1", "true", "TRUE"] {
            let request = Request::builder()
                .header("x-user-id", "42")
                .header("x-session-id", "sess-abc")
                .header("x-user-admin", value)
                .body(())
                .unwrap();
            assert!(extract(request).await.unwrap().is_admin, "value {value:?}");
        }

        let request = Request::builder()
            .header("x-user-id", "42")
            .header("x-session-id", "sess-abc")
            .header("x-user-admin", "0")
            .body(())
            .unwrap();
        assert!(!extract(request).await.unwrap().is_admin);
    }

    #[tokio::test]
    async fn test_rejects_missing_or_malformed_identity() {
        // No headers at all
        let bare = Request::builder().body(()).unwrap();
        assert!(matches!(extract(bare).await, Err(ApiError::Unauthorized)));

        // Non-numeric user id
        let garbled = Request::builder()
            .header("x-user-id", "robert'); drop table messages;--")
            .header("x-session-id", "sess-abc")
            .body(())
            .unwrap();
        assert!(matches!(extract(garbled).await, Err(ApiError::Unauthorized)));

        // Zero and negative ids are not valid users
        for bad in ["0", "-3"] {
            let request = Request::builder()
                .header("x-user-id", bad)
                .header("x-session-id", "sess-abc")
                .body(())
                .unwrap();
            assert!(matches!(extract(request).await, Err(ApiError::Unauthorized)));
        }

        // Missing session
        let no_session = Request::builder()
            .header("x-user-id", "42")
            .body(())
            .unwrap();
        assert!(matches!(
            extract(no_session).await,
            Err(ApiError::Unauthorized)
        ));
    }
}
