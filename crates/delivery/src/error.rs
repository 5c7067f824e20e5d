//! Delivery error types.

use thiserror::Error;

/// Errors that can occur while computing deliverable messages.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The underlying store query failed
    #[error("store error: {0}")]
    Store(#[from] message_store::StoreError),
}
