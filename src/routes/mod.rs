//! API route handlers.

pub mod auth;
pub mod chat;

use crate::auth::AppState;
use axum::{routing::post, Router};

/// Build the API router with all endpoints.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/auth", post(auth::authenticate))
        .route("/api/chat", post(chat::chat))
}
