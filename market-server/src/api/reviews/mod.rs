//! Review API Module

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_admin;
use crate::core::ServerState;

/// Review router
///
/// Product review listings are served under `/api/products/{id}/reviews`.
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/reviews", routes())
}

fn routes() -> Router<ServerState> {
    let user_routes = Router::new()
        .route("/", post(handler::create))
        .route("/mine", get(handler::list_mine))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route("/{id}/helpful", post(handler::toggle_helpful));

    // 审核路由：仅管理员
    let moderation_routes = Router::new()
        .route("/pending", get(handler::list_pending))
        .route("/{id}/moderate", put(handler::moderate))
        .layer(middleware::from_fn(require_admin));

    user_routes.merge(moderation_routes)
}
