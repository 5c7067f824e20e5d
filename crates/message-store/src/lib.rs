//! SQLite persistence layer for Parley's message delivery.
//!
//! This crate provides async operations for direct messages and user
//! presence using SQLx with SQLite. Message ids are strictly increasing
//! and never reused, which is what lets the delivery layer treat "highest
//! id a client has seen" as a resumable position.
//!
//! # Example
//!
//! ```no_run
//! use message_store::{message, models::NewMessage, Store};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let store = Store::connect("sqlite:parley.db?mode=rwc").await?;
//!     store.migrate().await?;
//!
//!     let sent = message::append(store.pool(), &NewMessage::text(1, 2, "hello")).await?;
//!     println!("stored with id {}", sent.id);
//!
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod message;
pub mod models;
pub mod presence;
pub mod validation;

pub use error::{Result, StoreError};
pub use models::{AttachmentType, Message, NewMessage, PresenceRecord, PresenceStatus};
pub use validation::ValidationError;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Default pool size for database connections.
    /// Sized for many concurrent delivery waits sharing one pool.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> message_store::Result<()> {
    /// // File database
    /// let store = message_store::Store::connect("sqlite:data/parley.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let store = message_store::Store::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Current wall clock as unix seconds.
pub(crate) fn now_epoch() -> i64 {
    Utc::now().timestamp()
}
