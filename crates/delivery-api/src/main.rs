//! HTTP delivery endpoints for Parley.
//!
//! Exposes message send, bounded long-poll, SSE event stream, conversation
//! history, and presence over axum. Authentication happens upstream; this
//! service trusts the identity headers the auth layer forwards.

mod config;
mod error;
mod identity;
mod routes;
mod session;
mod state;

use message_store::Store;
use tracing::info;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting delivery API");

    // Connect to the store
    let store = Store::connect(&config.database_url).await?;
    store.migrate().await?;

    // Build application state
    let state = AppState::new(store, config.delivery.clone());

    // Build router
    let app = routes::router().with_state(state);

    // Start server
    info!(addr = %config.addr, "Delivery API listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
