//! Cart API Module

mod handler;

use axum::{
    Router,
    routing::{get, put},
};

use crate::core::ServerState;

/// Cart router (signed-in users)
pub fn router() -> Router<ServerState> {
    Router::new().nest(
        "/api/cart",
        Router::new()
            .route(
                "/",
                get(handler::get_cart)
                    .post(handler::add_item)
                    .delete(handler::clear),
            )
            .route(
                "/{product_id}",
                put(handler::update_item).delete(handler::remove_item),
            ),
    )
}
