//! 下单超时测试
//!
//! 超时只覆盖校验和事务（直到 COMMIT）：
//! - 提交前超时：调用方拿到 TimeoutError，事务回滚，库存不动
//! - 提交后的重新读取和通知再慢，也必须返回成功，否则客户端重试会重复下单

mod common;

use std::time::{Duration, Instant};

use common::*;
use market_server::orders::OrderError;
use market_server::{AppError, ErrorCode};
use shared::models::UserRole;

const SHORT_TIMEOUT_MS: u64 = 200;

async fn short_timeout_env() -> TestEnv {
    setup_with(|config| config.order_timeout_ms = SHORT_TIMEOUT_MS).await
}

async fn notification_count(env: &TestEnv) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM notification")
        .fetch_one(env.state.get_pool())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_timeout_before_commit_rolls_back() {
    let env = short_timeout_env().await;
    let state = &env.state;
    let seller = create_user(state, UserRole::Seller).await;
    let buyer = create_user(state, UserRole::Buyer).await;
    let product = create_product(state, seller.id, 20.0, 5).await;

    // 另一个连接持有写锁，下单事务的第一条 UPDATE 只能等 busy_timeout
    let mut blocker = state.get_pool().begin().await.unwrap();
    sqlx::query("UPDATE sequence_counter SET value = value WHERE name = 'order_number'")
        .execute(&mut *blocker)
        .await
        .unwrap();

    let err = state
        .order_service()
        .create(buyer.id, order_for(&[(product.id, 2)]))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::Timeout));
    let app_err = AppError::from(err);
    assert_eq!(app_err.code, ErrorCode::TimeoutError);
    assert_eq!(app_err.http_status().as_u16(), 503);

    blocker.rollback().await.unwrap();
    // 被取消的事务在自己的连接上排队回滚
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(order_count(state).await, 0);
    let product_after = reload_product(state, product.id).await;
    assert_eq!(product_after.stock, 5);
    assert_eq!(product_after.sales, 0);

    // 锁释放后同一个请求可以正常完成
    let order = state
        .order_service()
        .create(buyer.id, order_for(&[(product.id, 2)]))
        .await
        .unwrap();
    assert_eq!(order.items[0].quantity, 2);
    assert_eq!(reload_product(state, product.id).await.stock, 3);
}

#[tokio::test]
async fn test_slow_notifications_after_commit_still_return_order() {
    let env = short_timeout_env().await;
    let state = &env.state;
    let seller = create_user(state, UserRole::Seller).await;
    let buyer = create_user(state, UserRole::Buyer).await;
    let product = create_product(state, seller.id, 20.0, 5).await;

    // 每插入一条通知都做一次大交叉连接，远超过下单超时
    sqlx::query("CREATE TABLE slow_rows (n INTEGER NOT NULL)")
        .execute(state.get_pool())
        .await
        .unwrap();
    sqlx::query(
        "INSERT INTO slow_rows (n) \
         WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < 4000) \
         SELECT n FROM seq",
    )
    .execute(state.get_pool())
    .await
    .unwrap();
    sqlx::query(
        "CREATE TRIGGER slow_notification BEFORE INSERT ON notification BEGIN \
         SELECT COUNT(*) FROM slow_rows a, slow_rows b WHERE (a.n * b.n) % 7 = 3; \
         END",
    )
    .execute(state.get_pool())
    .await
    .unwrap();

    let started = Instant::now();
    let order = state
        .order_service()
        .create(buyer.id, order_for(&[(product.id, 2)]))
        .await
        .unwrap();
    assert!(started.elapsed() > Duration::from_millis(SHORT_TIMEOUT_MS));

    assert_eq!(order.buyer_id, buyer.id);
    assert_eq!(order_count(state).await, 1);
    assert_eq!(reload_product(state, product.id).await.stock, 3);
    // 买家一条，卖家一条
    assert_eq!(notification_count(&env).await, 2);
}
