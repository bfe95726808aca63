//! Product API Module
//!
//! Catalog reads are public; writes need a seller (own products) or admin.
//! Product review listings live here as they are keyed by product.

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_seller;
use crate::core::ServerState;

/// Product router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/products", routes())
}

fn routes() -> Router<ServerState> {
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/reviews", get(handler::list_reviews))
        .route("/{id}/reviews/distribution", get(handler::rating_distribution));

    // 卖家路由：卖家或管理员
    let manage_routes = Router::new()
        .route("/", post(handler::create))
        .route("/mine", get(handler::list_mine))
        .route("/{id}", put(handler::update).delete(handler::delete))
        .layer(middleware::from_fn(require_seller));

    read_routes.merge(manage_routes)
}
