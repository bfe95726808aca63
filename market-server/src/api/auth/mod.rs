//! Authentication API Module

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

/// Auth router
///
/// `register` / `login` are public (see `require_auth`), `me` needs a token.
pub fn router() -> Router<ServerState> {
    Router::new().nest(
        "/api/auth",
        Router::new()
            .route("/register", post(handler::register))
            .route("/login", post(handler::login))
            .route("/me", get(handler::me)),
    )
}
