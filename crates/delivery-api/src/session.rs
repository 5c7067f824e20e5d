//! Per-session request serialization.
//!
//! The platform serializes requests that share a session: every handler
//! takes its session's hold before touching the store. The two waiting
//! transports drop the hold before they park, because one open long poll
//! holding it would stall every other request on that session (another
//! tab, a profile edit) for up to the full wait bound.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Past this many tracked sessions, idle entries are swept on the next
/// acquire.
const SWEEP_THRESHOLD: usize = 1024;

/// Registry of per-session locks.
#[derive(Clone, Default)]
pub struct SessionLocks {
    inner: Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>,
}

/// Exclusive hold on one session. Dropping it admits the session's next
/// queued request.
pub struct SessionHold {
    _guard: OwnedMutexGuard<()>,
}

impl SessionLocks {
    /// Take the hold for `session_id`, queueing behind whoever has it.
    pub async fn acquire(&self, session_id: &str) -> SessionHold {
        let lock = {
            let mut map = self.inner.lock().expect("session registry poisoned");
            if map.len() > SWEEP_THRESHOLD {
                // Entries nobody holds or waits on can go; strong_count 1
                // means the map holds the only reference
                map.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            Arc::clone(map.entry(session_id.to_string()).or_default())
        };

        SessionHold {
            _guard: lock.lock_owned().await,
        }
    }

    /// Number of sessions currently tracked.
    pub fn tracked(&self) -> usize {
        self.inner.lock().expect("session registry poisoned").len()
    }
}

impl SessionHold {
    /// Release the hold. Equivalent to dropping it; named so the
    /// release-before-wait step in the transports reads as intent.
    pub fn release(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_session_serializes() {
        let locks = SessionLocks::default();
        let hold = locks.acquire("sess-1").await;

        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                locks.acquire("sess-1").await;
            })
        };

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(
            !contender.is_finished(),
            "second request must queue behind the hold"
        );

        hold.release();
        tokio::time::timeout(Duration::from_secs(1), contender)
            .await
            .expect("queued request should run once the hold is released")
            .unwrap();
    }

    #[tokio::test]
    async fn test_different_sessions_run_concurrently() {
        let locks = SessionLocks::default();
        let _hold = locks.acquire("sess-1").await;

        let other = tokio::time::timeout(Duration::from_millis(100), locks.acquire("sess-2")).await;
        assert!(other.is_ok(), "distinct sessions must not serialize");
    }

    #[tokio::test]
    async fn test_reacquire_after_release() {
        let locks = SessionLocks::default();

        let hold = locks.acquire("sess-1").await;
        hold.release();

        let again = tokio::time::timeout(Duration::from_millis(100), locks.acquire("sess-1")).await;
        assert!(again.is_ok());
        assert_eq!(locks.tracked(), 1);
    }
}
