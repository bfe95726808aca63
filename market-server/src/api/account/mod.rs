//! Account API Module
//!
//! Profile, saved addresses, wishlist and seller onboarding of the
//! signed-in user.

mod handler;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::auth::require_admin;
use crate::core::ServerState;

/// Account router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/users", routes())
}

fn routes() -> Router<ServerState> {
    let own_routes = Router::new()
        .route("/profile", get(handler::get_profile).put(handler::update_profile))
        .route("/change-password", put(handler::change_password))
        .route(
            "/addresses",
            get(handler::list_addresses).post(handler::add_address),
        )
        .route(
            "/addresses/{id}",
            put(handler::update_address).delete(handler::delete_address),
        )
        .route(
            "/seller-application",
            get(handler::get_seller_application).post(handler::apply_for_seller),
        )
        .route("/wishlist", get(handler::list_wishlist))
        .route(
            "/wishlist/{product_id}",
            post(handler::add_to_wishlist).delete(handler::remove_from_wishlist),
        );

    // 管理路由：仅管理员可用
    let manage_routes = Router::new()
        .route("/{id}/status", put(handler::set_account_status))
        .layer(middleware::from_fn(require_admin));

    own_routes.merge(manage_routes)
}
