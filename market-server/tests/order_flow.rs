//! 下单流程集成测试
//!
//! 金额、库存扣减、购物车清空、优惠券计数都在同一事务里生效或全部不生效

mod common;

use common::*;
use market_server::db::repository::{cart, coupon, order};
use market_server::orders::OrderError;
use market_server::{AppError, ErrorCode};
use shared::models::{OrderStatus, ProductStatus, UserRole};

#[tokio::test]
async fn test_create_order_computes_totals_and_decrements_stock() {
    let env = setup().await;
    let state = &env.state;
    let seller = create_user(state, UserRole::Seller).await;
    let buyer = create_user(state, UserRole::Buyer).await;
    let product = create_product(state, seller.id, 20.0, 5).await;

    cart::add(state.get_pool(), buyer.id, product.id, 2)
        .await
        .unwrap();

    let order = state
        .order_service()
        .create(buyer.id, order_for(&[(product.id, 2)]))
        .await
        .unwrap();

    assert_eq!(order.subtotal, 40.0);
    assert_eq!(order.tax, 2.0);
    assert_eq!(order.shipping_cost, 10.0);
    assert_eq!(order.discount, 0.0);
    assert_eq!(order.total_amount, 52.0);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.billing_address, order.shipping_address);

    assert!(order.order_number.starts_with("ORD"));
    assert_eq!(order.order_number.len(), 13);
    assert!(order.order_number[3..].chars().all(|c| c.is_ascii_digit()));

    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].price, 20.0);
    assert_eq!(order.items[0].seller_id, seller.id);
    assert_eq!(order.status_history.len(), 1);
    assert_eq!(order.status_history[0].status, OrderStatus::Pending);

    let product = reload_product(state, product.id).await;
    assert_eq!(product.stock, 3);
    assert_eq!(product.sales, 2);

    let remaining = cart::find_by_user(state.get_pool(), buyer.id).await.unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn test_free_shipping_at_threshold() {
    let env = setup().await;
    let state = &env.state;
    let seller = create_user(state, UserRole::Seller).await;
    let buyer = create_user(state, UserRole::Buyer).await;
    let product = create_product(state, seller.id, 25.0, 10).await;

    let order = state
        .order_service()
        .create(buyer.id, order_for(&[(product.id, 2)]))
        .await
        .unwrap();

    assert_eq!(order.subtotal, 50.0);
    assert_eq!(order.shipping_cost, 0.0);
    assert_eq!(order.tax, 2.5);
    assert_eq!(order.total_amount, 52.5);
}

#[tokio::test]
async fn test_insufficient_stock_persists_nothing() {
    let env = setup().await;
    let state = &env.state;
    let seller = create_user(state, UserRole::Seller).await;
    let buyer = create_user(state, UserRole::Buyer).await;
    let product = create_product(state, seller.id, 20.0, 1).await;

    let err = state
        .order_service()
        .create(buyer.id, order_for(&[(product.id, 2)]))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderError::InsufficientStock {
            available: 1,
            requested: 2,
            ..
        }
    ));

    let app_err = AppError::from(err);
    assert_eq!(app_err.code, ErrorCode::ProductOutOfStock);
    assert_eq!(app_err.http_status().as_u16(), 400);
    assert!(app_err.message.contains(&product.title));

    assert_eq!(order_count(state).await, 0);
    assert_eq!(reload_product(state, product.id).await.stock, 1);
}

#[tokio::test]
async fn test_failing_line_rolls_back_other_lines() {
    let env = setup().await;
    let state = &env.state;
    let seller = create_user(state, UserRole::Seller).await;
    let buyer = create_user(state, UserRole::Buyer).await;
    let plenty = create_product(state, seller.id, 10.0, 10).await;
    let scarce = create_product(state, seller.id, 10.0, 1).await;

    let result = state
        .order_service()
        .create(buyer.id, order_for(&[(plenty.id, 3), (scarce.id, 2)]))
        .await;
    assert!(result.is_err());

    assert_eq!(order_count(state).await, 0);
    assert_eq!(reload_product(state, plenty.id).await.stock, 10);
    assert_eq!(reload_product(state, scarce.id).await.stock, 1);
}

#[tokio::test]
async fn test_duplicate_lines_are_checked_against_total_quantity() {
    let env = setup().await;
    let state = &env.state;
    let seller = create_user(state, UserRole::Seller).await;
    let buyer = create_user(state, UserRole::Buyer).await;
    let product = create_product(state, seller.id, 10.0, 3).await;

    let err = state
        .order_service()
        .create(buyer.id, order_for(&[(product.id, 2), (product.id, 2)]))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InsufficientStock { requested: 4, .. }));

    let order = state
        .order_service()
        .create(buyer.id, order_for(&[(product.id, 1), (product.id, 2)]))
        .await
        .unwrap();
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].quantity, 3);

    let product = reload_product(state, product.id).await;
    assert_eq!(product.stock, 0);
    assert_eq!(product.status, ProductStatus::OutOfStock);
}

#[tokio::test]
async fn test_unknown_and_inactive_products() {
    let env = setup().await;
    let state = &env.state;
    let buyer = create_user(state, UserRole::Buyer).await;

    let err = state
        .order_service()
        .create(buyer.id, order_for(&[(424242, 1)]))
        .await
        .unwrap_err();
    assert_eq!(AppError::from(err).code, ErrorCode::ProductNotFound);

    let err = state
        .order_service()
        .create(buyer.id, order_for(&[]))
        .await
        .unwrap_err();
    assert_eq!(AppError::from(err).code, ErrorCode::OrderEmpty);
}

#[tokio::test]
async fn test_coupon_discount_is_capped_and_recorded() {
    let env = setup().await;
    let state = &env.state;
    let seller = create_user(state, UserRole::Seller).await;
    let buyer = create_user(state, UserRole::Buyer).await;
    let product = create_product(state, seller.id, 100.0, 5).await;
    let coupon_row = create_percentage_coupon(state, seller.id, "save10", 10.0, Some(5.0)).await;

    let mut input = order_for(&[(product.id, 1)]);
    input.coupon_code = Some(" save10 ".into());
    let order = state.order_service().create(buyer.id, input).await.unwrap();

    assert_eq!(order.subtotal, 100.0);
    assert_eq!(order.discount, 5.0);
    assert_eq!(order.tax, 5.0);
    assert_eq!(order.shipping_cost, 0.0);
    assert_eq!(order.total_amount, 100.0);
    assert_eq!(order.coupon_code.as_deref(), Some("SAVE10"));

    let reloaded = coupon::find_by_id(state.get_pool(), coupon_row.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.used_count, 1);
    let usage = coupon::find_usage(state.get_pool(), coupon_row.id, buyer.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(usage.usage_count, 1);

    // 每人限用一次
    let mut again = order_for(&[(product.id, 1)]);
    again.coupon_code = Some("SAVE10".into());
    let err = state.order_service().create(buyer.id, again).await.unwrap_err();
    assert_eq!(AppError::from(err).code, ErrorCode::CouponUserLimitReached);
    assert_eq!(reload_product(state, product.id).await.stock, 4);
}

#[tokio::test]
async fn test_unknown_coupon_rejects_order() {
    let env = setup().await;
    let state = &env.state;
    let seller = create_user(state, UserRole::Seller).await;
    let buyer = create_user(state, UserRole::Buyer).await;
    let product = create_product(state, seller.id, 20.0, 5).await;

    let mut input = order_for(&[(product.id, 1)]);
    input.coupon_code = Some("NOPE".into());
    let err = state.order_service().create(buyer.id, input).await.unwrap_err();

    assert_eq!(AppError::from(err).code, ErrorCode::CouponNotFound);
    assert_eq!(order_count(state).await, 0);
    assert_eq!(reload_product(state, product.id).await.stock, 5);
}

#[tokio::test]
async fn test_verified_purchase_requires_delivered_order() {
    let env = setup().await;
    let state = &env.state;
    let seller = create_user(state, UserRole::Seller).await;
    let buyer = create_user(state, UserRole::Buyer).await;
    let product = create_product(state, seller.id, 20.0, 5).await;

    let placed = state
        .order_service()
        .create(buyer.id, order_for(&[(product.id, 1)]))
        .await
        .unwrap();
    assert!(
        !order::has_delivered_purchase(state.get_pool(), buyer.id, product.id)
            .await
            .unwrap()
    );

    let seller_user = current(&seller);
    for status in ["processing", "shipped", "delivered"] {
        state
            .order_service()
            .update_status(
                placed.id,
                &seller_user,
                shared::models::OrderStatusUpdate {
                    status: status.into(),
                    note: None,
                    tracking_number: None,
                    carrier: None,
                },
            )
            .await
            .unwrap();
    }
    assert!(
        order::has_delivered_purchase(state.get_pool(), buyer.id, product.id)
            .await
            .unwrap()
    );
}
