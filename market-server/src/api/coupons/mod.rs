//! Coupon API Module
//!
//! `validate` only quotes a discount; usage is recorded by order creation.

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::require_seller;
use crate::core::ServerState;

/// Coupon router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/coupons", routes())
}

fn routes() -> Router<ServerState> {
    // 任意登录用户
    let quote_routes = Router::new().route("/validate", post(handler::validate));

    // 管理路由：卖家 (仅自己的优惠券) 或管理员
    let manage_routes = Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .layer(middleware::from_fn(require_seller));

    quote_routes.merge(manage_routes)
}
