//! Notification API Module

mod handler;

use axum::{
    Router,
    routing::{delete, get, put},
};

use crate::core::ServerState;

/// Notification router (own notifications only)
pub fn router() -> Router<ServerState> {
    Router::new().nest(
        "/api/notifications",
        Router::new()
            .route("/", get(handler::list))
            .route("/unread-count", get(handler::unread_count))
            .route("/read-all", put(handler::mark_all_read))
            .route("/{id}/read", put(handler::mark_read))
            .route("/{id}", delete(handler::delete)),
    )
}
