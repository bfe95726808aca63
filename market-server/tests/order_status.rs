//! 订单状态机集成测试

mod common;

use common::*;
use market_server::{AppError, ErrorCode};
use shared::models::{Order, OrderStatus, OrderStatusUpdate, PaymentStatus, UserRole};

fn to(status: &str) -> OrderStatusUpdate {
    OrderStatusUpdate {
        status: status.into(),
        note: None,
        tracking_number: None,
        carrier: None,
    }
}

struct Fixture {
    env: TestEnv,
    seller: shared::models::User,
    buyer: shared::models::User,
    product_id: i64,
    order: Order,
}

async fn placed_order(quantity: i64, stock: i64) -> Fixture {
    let env = setup().await;
    let seller = create_user(&env.state, UserRole::Seller).await;
    let buyer = create_user(&env.state, UserRole::Buyer).await;
    let product = create_product(&env.state, seller.id, 20.0, stock).await;
    let order = env
        .state
        .order_service()
        .create(buyer.id, order_for(&[(product.id, quantity)]))
        .await
        .unwrap();
    Fixture {
        env,
        seller,
        buyer,
        product_id: product.id,
        order,
    }
}

#[tokio::test]
async fn test_full_lifecycle_keeps_money_fields() {
    let f = placed_order(2, 5).await;
    let service = f.env.state.order_service();
    let seller = current(&f.seller);

    service.update_status(f.order.id, &seller, to("processing")).await.unwrap();
    let shipped = service
        .update_status(
            f.order.id,
            &seller,
            OrderStatusUpdate {
                status: "shipped".into(),
                note: Some("Handed to carrier".into()),
                tracking_number: Some("TRK123".into()),
                carrier: Some("UPS".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(shipped.tracking_number.as_deref(), Some("TRK123"));
    assert_eq!(shipped.carrier.as_deref(), Some("UPS"));

    let delivered = service.update_status(f.order.id, &seller, to("delivered")).await.unwrap();
    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert!(delivered.delivered_at.is_some());
    assert_eq!(delivered.total_amount, f.order.total_amount);
    assert_eq!(delivered.subtotal, f.order.subtotal);

    let history: Vec<OrderStatus> = delivered.status_history.iter().map(|h| h.status).collect();
    assert_eq!(
        history,
        vec![
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
        ]
    );

    let err = service
        .update_status(f.order.id, &seller, to("cancelled"))
        .await
        .unwrap_err();
    assert_eq!(AppError::from(err).code, ErrorCode::OrderInvalidTransition);
}

#[tokio::test]
async fn test_cash_on_delivery_is_paid_on_delivery() {
    let env = setup().await;
    let state = &env.state;
    let seller = create_user(state, UserRole::Seller).await;
    let buyer = create_user(state, UserRole::Buyer).await;
    let product = create_product(state, seller.id, 20.0, 5).await;

    let mut input = order_for(&[(product.id, 1)]);
    input.payment_method = shared::models::PaymentMethod::CashOnDelivery;
    let order = state.order_service().create(buyer.id, input).await.unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Pending);

    let seller_user = current(&seller);
    for status in ["processing", "shipped", "delivered"] {
        state
            .order_service()
            .update_status(order.id, &seller_user, to(status))
            .await
            .unwrap();
    }
    let order = state.order_service().get(order.id, &current(&buyer)).await.unwrap();
    assert_eq!(order.payment_status, PaymentStatus::Paid);
}

#[tokio::test]
async fn test_skipping_states_is_rejected() {
    let f = placed_order(1, 5).await;
    let service = f.env.state.order_service();
    let seller = current(&f.seller);

    let err = service
        .update_status(f.order.id, &seller, to("delivered"))
        .await
        .unwrap_err();
    assert_eq!(AppError::from(err).code, ErrorCode::OrderInvalidTransition);

    let err = service
        .update_status(f.order.id, &seller, to("confirmed"))
        .await
        .unwrap_err();
    assert_eq!(AppError::from(err).code, ErrorCode::OrderInvalidStatus);

    let unchanged = service.get(f.order.id, &seller).await.unwrap();
    assert_eq!(unchanged.status, OrderStatus::Pending);
    assert_eq!(unchanged.status_history.len(), 1);
}

#[tokio::test]
async fn test_only_sellers_of_the_order_or_admins_update_status() {
    let f = placed_order(1, 5).await;
    let state = &f.env.state;
    let stranger = create_user(state, UserRole::Seller).await;
    let admin = create_user(state, UserRole::Admin).await;

    let err = state
        .order_service()
        .update_status(f.order.id, &current(&stranger), to("processing"))
        .await
        .unwrap_err();
    assert_eq!(AppError::from(err).code, ErrorCode::PermissionDenied);

    let err = state
        .order_service()
        .get(f.order.id, &current(&stranger))
        .await
        .unwrap_err();
    assert_eq!(AppError::from(err).code, ErrorCode::PermissionDenied);

    let order = state
        .order_service()
        .update_status(f.order.id, &current(&admin), to("processing"))
        .await
        .unwrap();
    assert_eq!(order.status, OrderStatus::Processing);
}

#[tokio::test]
async fn test_buyer_cancel_restores_stock_once() {
    let f = placed_order(2, 5).await;
    let state = &f.env.state;
    let buyer = current(&f.buyer);
    assert_eq!(reload_product(state, f.product_id).await.stock, 3);

    let cancelled = state
        .order_service()
        .cancel(f.order.id, &buyer, Some("Changed my mind".into()))
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.cancel_reason.as_deref(), Some("Changed my mind"));
    assert!(cancelled.cancelled_at.is_some());
    assert_eq!(reload_product(state, f.product_id).await.stock, 5);

    let err = state
        .order_service()
        .cancel(f.order.id, &buyer, None)
        .await
        .unwrap_err();
    assert_eq!(AppError::from(err).code, ErrorCode::OrderNotCancellable);
    assert_eq!(reload_product(state, f.product_id).await.stock, 5);
}

#[tokio::test]
async fn test_buyer_cannot_cancel_after_processing() {
    let f = placed_order(1, 5).await;
    let state = &f.env.state;
    state
        .order_service()
        .update_status(f.order.id, &current(&f.seller), to("processing"))
        .await
        .unwrap();

    let err = state
        .order_service()
        .cancel(f.order.id, &current(&f.buyer), None)
        .await
        .unwrap_err();
    assert_eq!(AppError::from(err).code, ErrorCode::OrderNotCancellable);

    let other = create_user(state, UserRole::Buyer).await;
    let err = state
        .order_service()
        .cancel(f.order.id, &current(&other), None)
        .await
        .unwrap_err();
    assert_eq!(AppError::from(err).code, ErrorCode::PermissionDenied);
}

#[tokio::test]
async fn test_seller_cancel_from_processing_reactivates_sold_out_product() {
    let f = placed_order(1, 1).await;
    let state = &f.env.state;
    let seller = current(&f.seller);
    assert_eq!(
        reload_product(state, f.product_id).await.status,
        shared::models::ProductStatus::OutOfStock
    );

    state
        .order_service()
        .update_status(f.order.id, &seller, to("processing"))
        .await
        .unwrap();
    let cancelled = state
        .order_service()
        .update_status(f.order.id, &seller, to("cancelled"))
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let product = reload_product(state, f.product_id).await;
    assert_eq!(product.stock, 1);
    assert_eq!(product.status, shared::models::ProductStatus::Active);
}
