//! Order API Module
//!
//! All order mutations go through `OrderService`.

mod handler;

use axum::{
    Router, middleware,
    routing::{get, put},
};

use crate::auth::{require_admin, require_seller};
use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    // 买家路由：下单、查看、取消
    let buyer_routes = Router::new()
        .route("/", get(handler::list_mine).post(handler::create))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/cancel", put(handler::cancel));

    // 卖家路由：订单状态流转
    let seller_routes = Router::new()
        .route("/seller/mine", get(handler::list_for_seller))
        .route("/{id}/status", put(handler::update_status))
        .layer(middleware::from_fn(require_seller));

    // 管理路由：全部订单
    let admin_routes = Router::new()
        .route("/admin/all", get(handler::list_all))
        .layer(middleware::from_fn(require_admin));

    buyer_routes.merge(seller_routes).merge(admin_routes)
}
