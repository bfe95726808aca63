//! Order Repository
//!
//! Row access for orders, their line items and the append-only status
//! history. Multi-statement writes take a `&mut SqliteConnection` so the
//! order engine can run them inside one transaction.

use super::RepoResult;
use shared::models::{
    Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus, PostalAddress, StatusHistoryEntry,
};
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

const ORDER_COLUMNS: &str = "o.id, o.order_number, o.buyer_id, o.subtotal, o.tax, o.shipping_cost, o.discount, o.total_amount, o.shipping_address, o.billing_address, o.status, o.payment_method, o.payment_status, o.coupon_code, o.tracking_number, o.carrier, o.notes, o.delivered_at, o.cancelled_at, o.cancel_reason, o.created_at, o.updated_at";

/// Sequence row used for order numbers
pub const ORDER_SEQUENCE: &str = "order_number";

/// Order row values, computed once by the order engine
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: i64,
    pub order_number: String,
    pub buyer_id: i64,
    pub subtotal: f64,
    pub tax: f64,
    pub shipping_cost: f64,
    pub discount: f64,
    pub total_amount: f64,
    pub shipping_address: PostalAddress,
    pub billing_address: PostalAddress,
    pub payment_method: PaymentMethod,
    pub coupon_code: Option<String>,
    pub notes: Option<String>,
}

/// Line snapshot taken from the product at order time
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub seller_id: i64,
    pub title: String,
    pub image: Option<String>,
    pub quantity: i64,
    pub price: f64,
    pub variant_name: Option<String>,
    pub variant_value: Option<String>,
}

/// Field changes that accompany a status transition
#[derive(Debug, Clone, Default)]
pub struct TransitionFields {
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub delivered_at: Option<i64>,
    pub cancelled_at: Option<i64>,
    pub cancel_reason: Option<String>,
    pub payment_status: Option<PaymentStatus>,
}

/// Atomically bump a named counter and return the new value
pub async fn next_sequence(conn: &mut SqliteConnection, name: &str) -> RepoResult<i64> {
    let (value,): (i64,) = sqlx::query_as(
        "UPDATE sequence_counter SET value = value + 1 WHERE name = ? RETURNING value",
    )
    .bind(name)
    .fetch_one(&mut *conn)
    .await?;
    Ok(value)
}

pub async fn insert_order(conn: &mut SqliteConnection, order: &NewOrder, now: i64) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO orders (id, order_number, buyer_id, subtotal, tax, shipping_cost, discount, total_amount, shipping_address, billing_address, status, payment_method, payment_status, coupon_code, notes, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 'pending', ?11, 'pending', ?12, ?13, ?14, ?14)",
    )
    .bind(order.id)
    .bind(&order.order_number)
    .bind(order.buyer_id)
    .bind(order.subtotal)
    .bind(order.tax)
    .bind(order.shipping_cost)
    .bind(order.discount)
    .bind(order.total_amount)
    .bind(Json(&order.shipping_address))
    .bind(Json(&order.billing_address))
    .bind(order.payment_method)
    .bind(&order.coupon_code)
    .bind(&order.notes)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn insert_item(
    conn: &mut SqliteConnection,
    order_id: i64,
    item: &NewOrderItem,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO order_item (id, order_id, product_id, seller_id, title, image, quantity, price, variant_name, variant_value) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )
    .bind(shared::util::snowflake_id())
    .bind(order_id)
    .bind(item.product_id)
    .bind(item.seller_id)
    .bind(&item.title)
    .bind(&item.image)
    .bind(item.quantity)
    .bind(item.price)
    .bind(&item.variant_name)
    .bind(&item.variant_value)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn append_history(
    conn: &mut SqliteConnection,
    order_id: i64,
    status: OrderStatus,
    note: Option<&str>,
    now: i64,
) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO order_status_history (id, order_id, status, note, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(shared::util::snowflake_id())
    .bind(order_id)
    .bind(status)
    .bind(note)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Compare-and-set the status. Returns `false` when the order is no longer
/// in `from` (a concurrent transition won).
pub async fn transition(
    conn: &mut SqliteConnection,
    order_id: i64,
    from: OrderStatus,
    to: OrderStatus,
    fields: &TransitionFields,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE orders SET \
            status = ?1, \
            tracking_number = COALESCE(?2, tracking_number), \
            carrier = COALESCE(?3, carrier), \
            delivered_at = COALESCE(?4, delivered_at), \
            cancelled_at = COALESCE(?5, cancelled_at), \
            cancel_reason = COALESCE(?6, cancel_reason), \
            payment_status = COALESCE(?7, payment_status), \
            updated_at = ?8 \
         WHERE id = ?9 AND status = ?10",
    )
    .bind(to)
    .bind(&fields.tracking_number)
    .bind(&fields.carrier)
    .bind(fields.delivered_at)
    .bind(fields.cancelled_at)
    .bind(&fields.cancel_reason)
    .bind(fields.payment_status)
    .bind(now)
    .bind(order_id)
    .bind(from)
    .execute(&mut *conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// Order row without relations
pub async fn find_row(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders o WHERE o.id = ?");
    let row = sqlx::query_as::<_, Order>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_items(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<OrderItem>> {
    let rows = sqlx::query_as::<_, OrderItem>(
        "SELECT id, order_id, product_id, seller_id, title, image, quantity, price, variant_name, variant_value FROM order_item WHERE order_id = ? ORDER BY rowid",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn find_history(pool: &SqlitePool, order_id: i64) -> RepoResult<Vec<StatusHistoryEntry>> {
    let rows = sqlx::query_as::<_, StatusHistoryEntry>(
        "SELECT id, order_id, status, note, created_at FROM order_status_history WHERE order_id = ? ORDER BY created_at, rowid",
    )
    .bind(order_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Order with items and status history
pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Order>> {
    let Some(mut order) = find_row(pool, id).await? else {
        return Ok(None);
    };
    order.items = find_items(pool, id).await?;
    order.status_history = find_history(pool, id).await?;
    Ok(Some(order))
}

async fn attach_items(pool: &SqlitePool, orders: &mut [Order]) -> RepoResult<()> {
    for order in orders.iter_mut() {
        order.items = find_items(pool, order.id).await?;
    }
    Ok(())
}

/// Which orders a listing covers
#[derive(Debug, Clone, Copy)]
pub enum OrderScope {
    Buyer(i64),
    /// Orders with at least one line sold by this seller
    Seller(i64),
    All,
}

fn push_scope(qb: &mut QueryBuilder<'_, Sqlite>, scope: OrderScope, status: Option<OrderStatus>) {
    qb.push(" WHERE 1 = 1");
    match scope {
        OrderScope::Buyer(buyer_id) => {
            qb.push(" AND o.buyer_id = ").push_bind(buyer_id);
        }
        OrderScope::Seller(seller_id) => {
            qb.push(" AND EXISTS (SELECT 1 FROM order_item i WHERE i.order_id = o.id AND i.seller_id = ")
                .push_bind(seller_id)
                .push(")");
        }
        OrderScope::All => {}
    }
    if let Some(status) = status {
        qb.push(" AND o.status = ").push_bind(status);
    }
}

/// Newest first; returns the page (with items) and the total count
pub async fn list(
    pool: &SqlitePool,
    scope: OrderScope,
    status: Option<OrderStatus>,
    limit: i64,
    offset: i64,
) -> RepoResult<(Vec<Order>, i64)> {
    let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {ORDER_COLUMNS} FROM orders o"));
    push_scope(&mut qb, scope, status);
    qb.push(" ORDER BY o.created_at DESC, o.id DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let mut rows = qb.build_query_as::<Order>().fetch_all(pool).await?;
    attach_items(pool, &mut rows).await?;

    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM orders o");
    push_scope(&mut count, scope, status);
    let (total,): (i64,) = count.build_query_as().fetch_one(pool).await?;

    Ok((rows, total))
}

/// Whether the user has a delivered order containing the product
pub async fn has_delivered_purchase(
    pool: &SqlitePool,
    user_id: i64,
    product_id: i64,
) -> RepoResult<bool> {
    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM orders o JOIN order_item i ON i.order_id = o.id \
         WHERE o.buyer_id = ? AND i.product_id = ? AND o.status = 'delivered')",
    )
    .bind(user_id)
    .bind(product_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}
