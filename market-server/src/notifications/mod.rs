//! Notification fan-out
//!
//! Rows are written after the business transaction has committed. A failed
//! insert is logged and never fails the caller.

use crate::db::repository::notification;
use shared::models::{Message, NotificationCreate, NotificationKind, Order, OrderStatus, Review};
use sqlx::SqlitePool;
use std::collections::BTreeSet;

/// Best-effort insert
pub async fn notify(pool: &SqlitePool, data: NotificationCreate) {
    if let Err(e) = notification::create(pool, &data).await {
        tracing::warn!(
            recipient_id = data.recipient_id,
            kind = ?data.kind,
            error = %e,
            "Failed to write notification"
        );
    }
}

fn order_link(order: &Order) -> Option<String> {
    Some(format!("/orders/{}", order.id))
}

/// Buyer confirmation plus one notice per distinct seller
pub async fn order_placed(pool: &SqlitePool, order: &Order) {
    notify(
        pool,
        NotificationCreate {
            recipient_id: order.buyer_id,
            kind: NotificationKind::OrderPlaced,
            title: "Order placed".into(),
            message: format!("Your order {} has been placed", order.order_number),
            link: order_link(order),
            related_order_id: Some(order.id),
            related_product_id: None,
        },
    )
    .await;

    let sellers: BTreeSet<i64> = order.items.iter().map(|i| i.seller_id).collect();
    for seller_id in sellers {
        notify(
            pool,
            NotificationCreate {
                recipient_id: seller_id,
                kind: NotificationKind::OrderPlaced,
                title: "New order".into(),
                message: format!("You received a new order {}", order.order_number),
                link: order_link(order),
                related_order_id: Some(order.id),
                related_product_id: None,
            },
        )
        .await;
    }
}

/// Tell the buyer about a status change
pub async fn order_status_changed(pool: &SqlitePool, order: &Order, kind: NotificationKind) {
    let message = match order.status {
        OrderStatus::Cancelled => format!("Your order {} has been cancelled", order.order_number),
        status => format!("Your order {} is now {}", order.order_number, status),
    };
    notify(
        pool,
        NotificationCreate {
            recipient_id: order.buyer_id,
            kind,
            title: "Order update".into(),
            message,
            link: order_link(order),
            related_order_id: Some(order.id),
            related_product_id: None,
        },
    )
    .await;
}

/// Tell the seller a product got a new review
pub async fn review_received(pool: &SqlitePool, seller_id: i64, product_title: &str, review: &Review) {
    notify(
        pool,
        NotificationCreate {
            recipient_id: seller_id,
            kind: NotificationKind::ReviewReceived,
            title: "New review".into(),
            message: format!("{product_title} received a {}-star review", review.rating),
            link: Some(format!("/products/{}", review.product_id)),
            related_order_id: None,
            related_product_id: Some(review.product_id),
        },
    )
    .await;
}

/// Tell the other participant a message arrived
pub async fn message_received(pool: &SqlitePool, recipient_id: i64, sender_name: &str, message: &Message) {
    notify(
        pool,
        NotificationCreate {
            recipient_id,
            kind: NotificationKind::NewMessage,
            title: "New message".into(),
            message: format!("{sender_name} sent you a message"),
            link: Some(format!("/messages/{}", message.conversation_id)),
            related_order_id: None,
            related_product_id: None,
        },
    )
    .await;
}

/// Confirm a paid seller application
pub async fn seller_approved(pool: &SqlitePool, user_id: i64) {
    notify(
        pool,
        NotificationCreate {
            recipient_id: user_id,
            kind: NotificationKind::SellerApproved,
            title: "Seller account approved".into(),
            message: "Your seller application was approved. You can now list products".into(),
            link: Some("/seller/dashboard".into()),
            related_order_id: None,
            related_product_id: None,
        },
    )
    .await;
}
