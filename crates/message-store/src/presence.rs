//! Presence tracking.
//!
//! Presence is a side effect of authenticated traffic: every request and
//! every stream heartbeat refreshes the caller's row. Reads apply a
//! staleness cutoff because polling clients simply stop calling when they
//! go away.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::models::{PresenceRecord, PresenceStatus};
use crate::now_epoch;

/// Activity age beyond which a user reads as offline regardless of the
/// stored status.
pub const STALENESS_THRESHOLD_SECS: i64 = 300;

/// Record activity for `user_id`: upsert the status and refresh last_seen.
pub async fn touch(pool: &SqlitePool, user_id: i64, status: PresenceStatus) -> Result<()> {
    touch_at(pool, user_id, status, now_epoch()).await
}

pub(crate) async fn touch_at(
    pool: &SqlitePool,
    user_id: i64,
    status: PresenceStatus,
    now: i64,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO presence (user_id, status, last_seen)
        VALUES (?, ?, ?)
        ON CONFLICT (user_id) DO UPDATE
        SET status = excluded.status, last_seen = excluded.last_seen
        "#,
    )
    .bind(user_id)
    .bind(status)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

/// Stored presence for `user_id`, `None` if the user has never been seen.
///
/// This is the raw row. Report it through
/// [`PresenceRecord::effective_status`] so stale records read as offline.
pub async fn get(pool: &SqlitePool, user_id: i64) -> Result<Option<PresenceRecord>> {
    let record = sqlx::query_as::<_, PresenceRecord>(
        r#"
        SELECT user_id, status, last_seen
        FROM presence
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;

    async fn test_store() -> Store {
        let store = Store::connect("sqlite::memory:").await.unwrap();
        store.migrate().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_touch_upserts() {
        let store = test_store().await;
        let pool = store.pool();

        assert!(get(pool, 1).await.unwrap().is_none());

        touch(pool, 1, PresenceStatus::Online).await.unwrap();
        let record = get(pool, 1).await.unwrap().unwrap();
        assert_eq!(record.status, PresenceStatus::Online);
        assert!(record.last_seen > 0);

        touch(pool, 1, PresenceStatus::Away).await.unwrap();
        let record = get(pool, 1).await.unwrap().unwrap();
        assert_eq!(record.status, PresenceStatus::Away);

        // Other users are untouched
        assert!(get(pool, 2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_record_reads_offline() {
        let store = test_store().await;
        let pool = store.pool();

        let now = now_epoch();
        touch_at(pool, 1, PresenceStatus::Online, now - STALENESS_THRESHOLD_SECS - 60)
            .await
            .unwrap();

        let record = get(pool, 1).await.unwrap().unwrap();
        assert_eq!(
            record.effective_status(now, STALENESS_THRESHOLD_SECS),
            PresenceStatus::Offline
        );

        // A fresh touch brings the user back
        touch_at(pool, 1, PresenceStatus::Online, now).await.unwrap();
        let record = get(pool, 1).await.unwrap().unwrap();
        assert_eq!(
            record.effective_status(now, STALENESS_THRESHOLD_SECS),
            PresenceStatus::Online
        );
    }
}
