//! Real-time message delivery for Parley.
//!
//! Both transports are built from one primitive: "messages for this user
//! newer than this watermark". The long poll re-runs it on a timer until
//! something appears or the wait bound elapses; the event stream runs it
//! on a tighter cadence for the life of the connection and pushes batches
//! as they show up. Each waiting client is an independent task parked on a
//! timer, and every read goes through the durable store, so any server can
//! answer any request.
//!
//! # Example
//!
//! ```no_run
//! use delivery::{wait_for_messages, DeliveryConfig, PollOutcome};
//! use message_store::Store;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Store::connect("sqlite:parley.db?mode=rwc").await?;
//! store.migrate().await?;
//!
//! let config = DeliveryConfig::default();
//! match wait_for_messages(store.pool(), 42, 100, &config).await {
//!     PollOutcome::Delivered(messages) => println!("{} new", messages.len()),
//!     PollOutcome::TimedOut => println!("nothing yet"),
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod poll;
mod query;
mod stream;

pub use config::DeliveryConfig;
pub use error::DeliveryError;
pub use poll::{wait_for_messages, PollOutcome};
pub use query::{deliverable, resolve_watermark, MessageBatch};
pub use stream::{message_events, StreamEvent};
