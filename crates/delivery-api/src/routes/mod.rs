//! Route handlers for the delivery API.

pub mod health;
pub mod messages;
pub mod poll;
pub mod presence;
pub mod stream;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Messages
        .route("/messages", post(messages::send))
        .route("/messages/unread", get(messages::unread))
        .route("/messages/:id", get(messages::fetch).delete(messages::remove))
        .route("/conversations/:peer_id", get(messages::conversation))
        // Delivery transports
        .route("/messages/poll", get(poll::poll))
        .route("/messages/stream", get(stream::stream))
        // Presence
        .route("/presence", post(presence::set_presence))
        .route("/presence/:user_id", get(presence::get_presence))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
