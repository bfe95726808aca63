//! 集成测试公共工具
//!
//! 每个测试独立的临时工作目录 + 文件型 SQLite (WAL)，
//! 并发测试需要真实的多连接池，不能用内存库。

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use market_server::auth::jwt::generate_printable_secret;
use market_server::auth::{CurrentUser, JwtConfig, JwtService, hash_password};
use market_server::db::DbService;
use market_server::db::repository::{coupon, product, user};
use market_server::services::HttpService;
use market_server::{Config, ServerState};
use serde_json::Value;
use shared::models::{
    Coupon, CouponCreate, DiscountType, OrderCreate, OrderItemInput, PaymentMethod, PostalAddress,
    Product, ProductCreate, User, UserRole,
};
use tempfile::TempDir;

pub const TEST_PASSWORD: &str = "correct-horse";

/// 测试环境：临时目录必须和状态活得一样久
pub struct TestEnv {
    pub state: ServerState,
    _dir: TempDir,
}

pub async fn setup() -> TestEnv {
    setup_with(|_| {}).await
}

/// 先应用默认测试配置，再由调用方改写（例如缩短下单超时）
pub async fn setup_with(customize: impl FnOnce(&mut Config)) -> TestEnv {
    let dir = TempDir::new().expect("temp dir");
    let work_dir = dir.path().to_string_lossy().to_string();

    let mut config = Config::with_overrides(work_dir, 0);
    config.tax_rate_percent = 5.0;
    config.free_shipping_threshold = 50.0;
    config.flat_shipping_cost = 10.0;
    config.order_timeout_ms = 10_000;
    config.jwt = JwtConfig {
        secret: generate_printable_secret(64),
        expiration_minutes: 60,
        issuer: "market-server".into(),
        audience: "market-clients".into(),
    };
    customize(&mut config);

    let db_path = config.database_path();
    let db = DbService::new(db_path.to_str().expect("utf-8 path"))
        .await
        .expect("open database");
    let jwt = Arc::new(JwtService::with_config(config.jwt.clone()));

    TestEnv {
        state: ServerState::new(config, db.pool, jwt),
        _dir: dir,
    }
}

pub async fn create_user(state: &ServerState, role: UserRole) -> User {
    let id = shared::util::snowflake_id();
    user::create(
        state.get_pool(),
        user::NewUser {
            first_name: "Test".into(),
            last_name: role.as_str().into(),
            email: format!("{}-{}@example.com", role.as_str(), id),
            password_hash: hash_password(TEST_PASSWORD).expect("hash"),
            phone: None,
            role,
            shop_name: (role == UserRole::Seller).then(|| "Test Shop".to_string()),
        },
    )
    .await
    .expect("create user")
}

pub fn current(user: &User) -> CurrentUser {
    CurrentUser {
        id: user.id,
        email: user.email.clone(),
        role: user.role,
    }
}

pub fn token_for(state: &ServerState, user: &User) -> String {
    state
        .get_jwt_service()
        .generate_token(user.id, &user.email, user.role)
        .expect("token")
}

pub async fn create_product(state: &ServerState, seller_id: i64, price: f64, stock: i64) -> Product {
    product::create(
        state.get_pool(),
        seller_id,
        ProductCreate {
            title: format!("Product {}", shared::util::snowflake_id()),
            description: "Test product".into(),
            price,
            compare_price: None,
            stock,
            category_id: None,
            images: vec![],
            tags: vec![],
            sku: None,
        },
    )
    .await
    .expect("create product")
}

pub async fn reload_product(state: &ServerState, id: i64) -> Product {
    product::find_by_id(state.get_pool(), id)
        .await
        .expect("query product")
        .expect("product exists")
}

/// 百分比优惠券，有效期从现在起一天
pub async fn create_percentage_coupon(
    state: &ServerState,
    created_by: i64,
    code: &str,
    percent: f64,
    max_discount: Option<f64>,
) -> Coupon {
    let now = shared::util::now_millis();
    coupon::create(
        state.get_pool(),
        created_by,
        CouponCreate {
            code: code.into(),
            description: "Test coupon".into(),
            discount_type: DiscountType::Percentage,
            discount_value: percent,
            min_purchase_amount: None,
            max_discount_amount: max_discount,
            start_date: Some(now - 60_000),
            expiry_date: now + 86_400_000,
            usage_limit: None,
            user_usage_limit: Some(1),
            applicable_categories: vec![],
            applicable_products: vec![],
            excluded_products: vec![],
        },
    )
    .await
    .expect("create coupon")
}

pub fn address() -> PostalAddress {
    PostalAddress {
        full_name: "Ana Buyer".into(),
        phone: "555-0100".into(),
        address_line1: "1 Main St".into(),
        address_line2: None,
        city: "Springfield".into(),
        state: "IL".into(),
        postal_code: "62701".into(),
        country: "US".into(),
    }
}

pub fn order_for(lines: &[(i64, i64)]) -> OrderCreate {
    OrderCreate {
        items: lines
            .iter()
            .map(|&(product_id, quantity)| OrderItemInput {
                product_id,
                quantity,
                variant: None,
            })
            .collect(),
        shipping_address: address(),
        billing_address: None,
        payment_method: PaymentMethod::CreditCard,
        coupon_code: None,
        notes: None,
    }
}

pub async fn order_count(state: &ServerState) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
        .fetch_one(state.get_pool())
        .await
        .expect("count orders")
}

/// 进程内发送一个 JSON 请求，返回状态码和解析后的响应体
pub async fn send(
    service: &HttpService,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = service.oneshot(request).await;
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}
