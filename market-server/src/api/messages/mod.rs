//! Messaging API Module
//!
//! Buyer/seller conversations persisted as rows; clients poll the list and
//! unread counters (no push channel).

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::ServerState;

/// Messaging router (participants only)
///
/// `/{id}` is a conversation for GET/POST and a message for DELETE.
pub fn router() -> Router<ServerState> {
    Router::new().nest(
        "/api/messages",
        Router::new()
            .route(
                "/conversations",
                get(handler::list_conversations).post(handler::open_conversation),
            )
            .route(
                "/{id}",
                get(handler::list_messages)
                    .post(handler::send_message)
                    .delete(handler::delete_message),
            )
            .route("/{id}/read", put(handler::mark_read)),
    )
}
