use std::time::Instant;

use axum::body::Body;
use axum::{Router, middleware};
use tower::Service;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;

use crate::auth::require_auth;
use crate::core::ServerState;

/// HTTP 请求日志中间件
async fn log_request(
    request: http::Request<Body>,
    next: middleware::Next,
) -> http::Response<Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    tracing::info!(target: "http_access", elapsed_ms, "{} {} {}", method, uri, status.as_u16());

    response
}

/// Build the Axum router (without state)
pub fn build_app() -> Router<ServerState> {
    Router::<ServerState>::new()
        // Core APIs
        .merge(crate::api::health::router())
        .merge(crate::api::auth::router())
        .merge(crate::api::account::router())
        // Catalog
        .merge(crate::api::categories::router())
        .merge(crate::api::products::router())
        // Shopping
        .merge(crate::api::cart::router())
        .merge(crate::api::orders::router())
        .merge(crate::api::coupons::router())
        // Social
        .merge(crate::api::reviews::router())
        .merge(crate::api::notifications::router())
        .merge(crate::api::messages::router())
}

/// Full application router: routes, auth and tower-http layers, state bound
pub fn build_router(state: ServerState) -> Router {
    build_app()
        // JWT 认证中间件 - require_auth 内部会跳过公共路由
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(log_request))
}

/// HTTP service: owns the bound router, serves it or answers in-process
/// requests
#[derive(Clone)]
pub struct HttpService {
    router: Router,
}

impl HttpService {
    pub fn new(state: ServerState) -> Self {
        Self {
            router: build_router(state),
        }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Dispatch one request without a socket
    pub async fn oneshot(&self, request: http::Request<Body>) -> http::Response<Body> {
        let mut service = self.router.clone();
        match service.call(request).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }
}
