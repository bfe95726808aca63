//! Order Service
//!
//! Every write path runs inside one SQLite transaction whose first statement
//! is a write, so concurrent requests serialize on the database write lock
//! instead of racing between a read and a later update.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use rust_decimal::Decimal;
use shared::models::{
    ItemVariant, Order, OrderCreate, OrderQuery, OrderStatus, OrderStatusUpdate, PaymentMethod,
    PaymentStatus, Product,
};
use sqlx::SqlitePool;

use super::error::{OrderError, OrderResult};
use super::numbering::format_order_number;
use super::status::{buyer_can_cancel, check_transition, notification_kind};
use crate::audit_log;
use crate::auth::CurrentUser;
use crate::db::repository::order::{
    self as order_repo, NewOrder, NewOrderItem, ORDER_SEQUENCE, OrderScope, TransitionFields,
};
use crate::db::repository::{RepoError, cart, coupon as coupon_repo, product as product_repo};
use crate::notifications;
use crate::pricing::coupon::{self as coupon_calc, CartProduct};
use crate::pricing::money::{MAX_QUANTITY, to_decimal};
use crate::pricing::{PricingPolicy, line_total};
use crate::utils::validation::{MAX_NOTE_LEN, validate_address, validate_optional_text};
use crate::utils::{Page, PageWindow};

/// One requested line after merging duplicates
#[derive(Debug, Clone, PartialEq)]
struct RequestedLine {
    product_id: i64,
    quantity: i64,
    variant: Option<ItemVariant>,
}

/// Coupon accepted during validation, recorded inside the transaction
#[derive(Debug, Clone)]
struct AppliedCoupon {
    id: i64,
    code: String,
    user_usage_limit: i64,
    discount: Decimal,
}

/// Merge lines naming the same product and variant; order of first
/// appearance is kept
fn merge_lines(input: &OrderCreate) -> OrderResult<Vec<RequestedLine>> {
    if input.items.is_empty() {
        return Err(OrderError::Empty);
    }

    let mut lines: Vec<RequestedLine> = Vec::with_capacity(input.items.len());
    for item in &input.items {
        if item.quantity < 1 || item.quantity > MAX_QUANTITY {
            return Err(quantity_out_of_range(item.quantity));
        }
        match lines
            .iter_mut()
            .find(|l| l.product_id == item.product_id && l.variant == item.variant)
        {
            Some(line) => line.quantity += item.quantity,
            None => lines.push(RequestedLine {
                product_id: item.product_id,
                quantity: item.quantity,
                variant: item.variant.clone(),
            }),
        }
    }
    // The bound applies to the merged line, not to each submitted fragment
    if let Some(line) = lines.iter().find(|l| l.quantity > MAX_QUANTITY) {
        return Err(quantity_out_of_range(line.quantity));
    }
    Ok(lines)
}

fn quantity_out_of_range(quantity: i64) -> OrderError {
    OrderError::Validation(format!(
        "quantity must be between 1 and {MAX_QUANTITY}, got {quantity}"
    ))
}

/// Units requested per product across all of its lines
fn quantity_per_product(lines: &[RequestedLine]) -> BTreeMap<i64, i64> {
    let mut totals = BTreeMap::new();
    for line in lines {
        *totals.entry(line.product_id).or_insert(0) += line.quantity;
    }
    totals
}

fn check_product(product: &Product, requested: i64) -> OrderResult<()> {
    if !product.is_active() {
        return Err(OrderError::ProductUnavailable {
            product_id: product.id,
            title: product.title.clone(),
        });
    }
    if requested > product.stock {
        return Err(OrderError::InsufficientStock {
            product_id: product.id,
            title: product.title.clone(),
            available: product.stock,
            requested,
        });
    }
    Ok(())
}

/// Order engine: placement, status transitions, cancellation and reads
#[derive(Debug, Clone)]
pub struct OrderService {
    pool: SqlitePool,
    pricing: PricingPolicy,
    timeout: Duration,
}

impl OrderService {
    pub fn new(pool: SqlitePool, pricing: PricingPolicy, timeout: Duration) -> Self {
        Self {
            pool,
            pricing,
            timeout,
        }
    }

    /// Place an order for `buyer_id`.
    ///
    /// Either the order, its stock reservations, coupon usage and the cart
    /// clear are all committed, or nothing is. The configured order timeout
    /// bounds validation and the transaction up to its commit; on expiry the
    /// open transaction is rolled back. Once committed the order is returned,
    /// however long the follow-up reads and notifications take.
    pub async fn create(&self, buyer_id: i64, input: OrderCreate) -> OrderResult<Order> {
        let order_id = match tokio::time::timeout(self.timeout, self.place(buyer_id, input)).await {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!(
                    buyer_id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Order creation timed out"
                );
                return Err(OrderError::Timeout);
            }
        };

        let order = self.load(order_id).await?;
        notifications::order_placed(&self.pool, &order).await;
        Ok(order)
    }

    /// Validate and commit a new order, returning its id
    async fn place(&self, buyer_id: i64, input: OrderCreate) -> OrderResult<i64> {
        // 1. Shape checks
        let lines = merge_lines(&input)?;
        validate_address(&input.shipping_address).map_err(|e| OrderError::Validation(e.message))?;
        if let Some(billing) = &input.billing_address {
            validate_address(billing).map_err(|e| OrderError::Validation(e.message))?;
        }
        validate_optional_text(&input.notes, "notes", MAX_NOTE_LEN)
            .map_err(|e| OrderError::Validation(e.message))?;

        // 2. Load and check every product before any write
        let per_product = quantity_per_product(&lines);
        let mut products: HashMap<i64, Product> = HashMap::with_capacity(per_product.len());
        for (&product_id, &requested) in &per_product {
            let product = product_repo::find_by_id(&self.pool, product_id)
                .await?
                .ok_or(OrderError::ProductNotFound(product_id))?;
            check_product(&product, requested)?;
            products.insert(product_id, product);
        }

        // 3. Snapshot lines and subtotal
        let mut items = Vec::with_capacity(lines.len());
        let mut subtotal = Decimal::ZERO;
        for line in &lines {
            let product = products
                .get(&line.product_id)
                .ok_or(OrderError::ProductNotFound(line.product_id))?;
            subtotal += line_total(product.price, line.quantity);
            items.push(NewOrderItem {
                product_id: product.id,
                seller_id: product.seller_id,
                title: product.title.clone(),
                image: product.cover_image().map(str::to_string),
                quantity: line.quantity,
                price: product.price,
                variant_name: line.variant.as_ref().map(|v| v.name.clone()),
                variant_value: line.variant.as_ref().map(|v| v.value.clone()),
            });
        }

        // 4. Coupon and totals
        let now = shared::util::now_millis();
        let coupon = match input.coupon_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => {
                let cart_products: Vec<CartProduct> = products
                    .values()
                    .map(|p| CartProduct {
                        product_id: p.id,
                        category_id: p.category_id,
                    })
                    .collect();
                Some(self.quote_coupon(buyer_id, code, subtotal, &cart_products, now).await?)
            }
            _ => None,
        };
        let discount = coupon.as_ref().map_or(Decimal::ZERO, |c| c.discount);
        let totals = self.pricing.calculate(subtotal, discount);

        // 5-7. Reserve, number, persist
        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;

        for (&product_id, &quantity) in &per_product {
            if !product_repo::reserve_stock(&mut *tx, product_id, quantity, now).await? {
                let title = products
                    .get(&product_id)
                    .map(|p| p.title.clone())
                    .unwrap_or_default();
                tracing::warn!(buyer_id, product_id, quantity, "Stock reservation lost a race");
                return Err(OrderError::StockConflict { product_id, title });
            }
        }

        let sequence = order_repo::next_sequence(&mut *tx, ORDER_SEQUENCE).await?;
        let order_number = format_order_number(&chrono::Utc::now(), sequence);
        let order_id = shared::util::snowflake_id();
        let shipping_address = input.shipping_address;
        let billing_address = input
            .billing_address
            .unwrap_or_else(|| shipping_address.clone());

        let new_order = NewOrder {
            id: order_id,
            order_number: order_number.clone(),
            buyer_id,
            subtotal: totals.subtotal,
            tax: totals.tax,
            shipping_cost: totals.shipping_cost,
            discount: totals.discount,
            total_amount: totals.total_amount,
            shipping_address,
            billing_address,
            payment_method: input.payment_method,
            coupon_code: coupon.as_ref().map(|c| c.code.clone()),
            notes: input.notes,
        };
        order_repo::insert_order(&mut *tx, &new_order, now).await?;
        for item in &items {
            order_repo::insert_item(&mut *tx, order_id, item).await?;
        }
        order_repo::append_history(&mut *tx, order_id, OrderStatus::Pending, Some("Order created"), now)
            .await?;

        if let Some(applied) = &coupon {
            if !coupon_repo::increment_used(&mut *tx, applied.id, now).await? {
                return Err(coupon_calc::CouponRejection::Exhausted.into());
            }
            if !coupon_repo::increment_user_usage(
                &mut *tx,
                applied.id,
                buyer_id,
                applied.user_usage_limit,
                now,
            )
            .await?
            {
                return Err(coupon_calc::CouponRejection::UserLimitReached.into());
            }
        }

        cart::clear(&mut *tx, buyer_id).await?;
        tx.commit().await.map_err(RepoError::from)?;

        tracing::info!(
            order_id,
            order_number = %order_number,
            buyer_id,
            lines = items.len(),
            total_amount = totals.total_amount,
            "Order created"
        );
        audit_log!(buyer_id, "order_create", order_number.as_str());
        Ok(order_id)
    }

    async fn quote_coupon(
        &self,
        buyer_id: i64,
        code: &str,
        subtotal: Decimal,
        products: &[CartProduct],
        now: i64,
    ) -> OrderResult<AppliedCoupon> {
        let coupon = coupon_repo::find_by_code(&self.pool, code)
            .await?
            .ok_or_else(|| OrderError::CouponNotFound(code.to_string()))?;
        let usage = coupon_repo::find_usage(&self.pool, coupon.id, buyer_id).await?;
        let quote = coupon_calc::quote(&coupon, usage.as_ref(), subtotal, products, now)?;
        Ok(AppliedCoupon {
            id: coupon.id,
            code: coupon.code,
            user_usage_limit: coupon.user_usage_limit,
            discount: to_decimal(quote.discount),
        })
    }

    /// Move an order along the transition table (seller of a line or admin)
    pub async fn update_status(
        &self,
        order_id: i64,
        actor: &CurrentUser,
        input: OrderStatusUpdate,
    ) -> OrderResult<Order> {
        let to = OrderStatus::parse(input.status.trim())
            .ok_or_else(|| OrderError::InvalidStatus(input.status.clone()))?;
        validate_optional_text(&input.note, "note", MAX_NOTE_LEN)
            .map_err(|e| OrderError::Validation(e.message))?;

        let order = self.load(order_id).await?;
        let is_seller = order.items.iter().any(|i| i.seller_id == actor.id);
        if !actor.is_admin() && !is_seller {
            return Err(OrderError::Forbidden(
                "Only a seller of this order or an admin can update its status".into(),
            ));
        }
        check_transition(order.status, to)?;

        let now = shared::util::now_millis();
        let mut fields = TransitionFields::default();
        match to {
            OrderStatus::Shipped => {
                fields.tracking_number = input.tracking_number.clone();
                fields.carrier = input.carrier.clone();
            }
            OrderStatus::Delivered => {
                fields.delivered_at = Some(now);
                if order.payment_method == PaymentMethod::CashOnDelivery {
                    fields.payment_status = Some(PaymentStatus::Paid);
                }
            }
            OrderStatus::Cancelled => {
                fields.cancelled_at = Some(now);
                fields.cancel_reason = input.note.clone();
            }
            OrderStatus::Pending | OrderStatus::Processing => {}
        }
        let note = input
            .note
            .unwrap_or_else(|| format!("Status changed to {to}"));

        if !self.apply_transition(&order, to, &fields, &note, now).await? {
            let current = self.load(order_id).await?;
            return Err(OrderError::InvalidTransition {
                from: current.status,
                to,
            });
        }

        tracing::info!(
            order_id,
            order_number = %order.order_number,
            from = %order.status,
            to = %to,
            actor_id = actor.id,
            "Order status changed"
        );
        audit_log!(actor.id, "order_status", order.order_number.as_str(), to.as_str());
        self.finish_transition(order_id, to).await
    }

    /// Buyer cancellation, allowed only while the order is pending
    pub async fn cancel(
        &self,
        order_id: i64,
        actor: &CurrentUser,
        reason: Option<String>,
    ) -> OrderResult<Order> {
        validate_optional_text(&reason, "reason", MAX_NOTE_LEN)
            .map_err(|e| OrderError::Validation(e.message))?;

        let order = self.load(order_id).await?;
        if order.buyer_id != actor.id {
            return Err(OrderError::Forbidden(
                "Only the buyer can cancel this order".into(),
            ));
        }
        if !buyer_can_cancel(order.status) {
            return Err(OrderError::NotCancellable(order.status));
        }

        let now = shared::util::now_millis();
        let fields = TransitionFields {
            cancelled_at: Some(now),
            cancel_reason: reason.clone(),
            ..Default::default()
        };
        let note = reason.unwrap_or_else(|| "Cancelled by buyer".to_string());

        if !self
            .apply_transition(&order, OrderStatus::Cancelled, &fields, &note, now)
            .await?
        {
            let current = self.load(order_id).await?;
            return Err(OrderError::NotCancellable(current.status));
        }

        tracing::info!(
            order_id,
            order_number = %order.order_number,
            buyer_id = actor.id,
            "Order cancelled by buyer"
        );
        audit_log!(actor.id, "order_cancel", order.order_number.as_str());
        self.finish_transition(order_id, OrderStatus::Cancelled).await
    }

    /// Compare-and-set the status, append history and restock on
    /// cancellation in one transaction. `false` means a concurrent
    /// transition moved the order first and nothing was written.
    async fn apply_transition(
        &self,
        order: &Order,
        to: OrderStatus,
        fields: &TransitionFields,
        note: &str,
        now: i64,
    ) -> OrderResult<bool> {
        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;

        if !order_repo::transition(&mut *tx, order.id, order.status, to, fields, now).await? {
            return Ok(false);
        }
        order_repo::append_history(&mut *tx, order.id, to, Some(note), now).await?;

        if to == OrderStatus::Cancelled {
            for item in &order.items {
                product_repo::restore_stock(&mut *tx, item.product_id, item.quantity, now).await?;
            }
        }

        tx.commit().await.map_err(RepoError::from)?;
        Ok(true)
    }

    async fn finish_transition(&self, order_id: i64, to: OrderStatus) -> OrderResult<Order> {
        let order = self.load(order_id).await?;
        if let Some(kind) = notification_kind(to) {
            notifications::order_status_changed(&self.pool, &order, kind).await;
        }
        Ok(order)
    }

    async fn load(&self, order_id: i64) -> OrderResult<Order> {
        order_repo::find_by_id(&self.pool, order_id)
            .await?
            .ok_or(OrderError::NotFound(order_id))
    }

    /// Single order, visible to its buyer, sellers of its lines and admins
    pub async fn get(&self, order_id: i64, viewer: &CurrentUser) -> OrderResult<Order> {
        let order = self.load(order_id).await?;
        let visible = viewer.is_admin()
            || order.buyer_id == viewer.id
            || order.items.iter().any(|i| i.seller_id == viewer.id);
        if !visible {
            return Err(OrderError::Forbidden(
                "You are not allowed to view this order".into(),
            ));
        }
        Ok(order)
    }

    async fn list(&self, scope: OrderScope, query: &OrderQuery) -> OrderResult<Page<Order>> {
        let window = PageWindow::new(query.page, query.limit);
        let (orders, total) =
            order_repo::list(&self.pool, scope, query.status, window.limit, window.offset()).await?;
        Ok(Page::new(orders, total, window))
    }

    pub async fn list_for_buyer(&self, buyer_id: i64, query: &OrderQuery) -> OrderResult<Page<Order>> {
        self.list(OrderScope::Buyer(buyer_id), query).await
    }

    pub async fn list_for_seller(
        &self,
        seller_id: i64,
        query: &OrderQuery,
    ) -> OrderResult<Page<Order>> {
        self.list(OrderScope::Seller(seller_id), query).await
    }

    pub async fn list_all(&self, query: &OrderQuery) -> OrderResult<Page<Order>> {
        self.list(OrderScope::All, query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{OrderItemInput, PostalAddress, ProductStatus};

    fn address() -> PostalAddress {
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

    fn create(items: Vec<OrderItemInput>) -> OrderCreate {
        OrderCreate {
            items,
            shipping_address: address(),
            billing_address: None,
            payment_method: PaymentMethod::CreditCard,
            coupon_code: None,
            notes: None,
        }
    }

    fn line(product_id: i64, quantity: i64, variant: Option<(&str, &str)>) -> OrderItemInput {
        OrderItemInput {
            product_id,
            quantity,
            variant: variant.map(|(name, value)| ItemVariant {
                name: name.into(),
                value: value.into(),
            }),
        }
    }

    fn product(stock: i64, status: ProductStatus) -> Product {
        Product {
            id: 1,
            seller_id: 2,
            category_id: None,
            title: "Desk Lamp".into(),
            description: String::new(),
            price: 20.0,
            compare_price: None,
            stock,
            sales: 0,
            status,
            images: vec![],
            tags: vec![],
            sku: None,
            rating: 0.0,
            review_count: 0,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_empty_order_is_rejected() {
        assert!(matches!(merge_lines(&create(vec![])), Err(OrderError::Empty)));
    }

    #[test]
    fn test_quantity_bounds() {
        assert!(matches!(
            merge_lines(&create(vec![line(1, 0, None)])),
            Err(OrderError::Validation(_))
        ));
        assert!(matches!(
            merge_lines(&create(vec![line(1, MAX_QUANTITY + 1, None)])),
            Err(OrderError::Validation(_))
        ));
    }

    #[test]
    fn test_merged_quantity_is_bounded() {
        let half = MAX_QUANTITY / 2 + 1;
        assert!(matches!(
            merge_lines(&create(vec![line(1, half, None), line(1, half, None)])),
            Err(OrderError::Validation(_))
        ));

        // Different variants stay separate lines, each within the bound
        let lines = merge_lines(&create(vec![
            line(1, half, Some(("size", "M"))),
            line(1, half, Some(("size", "L"))),
        ]))
        .unwrap();
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_duplicate_lines_merge_per_variant() {
        let lines = merge_lines(&create(vec![
            line(1, 2, Some(("size", "M"))),
            line(2, 1, None),
            line(1, 3, Some(("size", "M"))),
            line(1, 1, Some(("size", "L"))),
        ]))
        .unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].quantity, 5);
        assert_eq!(lines[1].product_id, 2);

        let per_product = quantity_per_product(&lines);
        assert_eq!(per_product[&1], 6);
        assert_eq!(per_product[&2], 1);
    }

    #[test]
    fn test_check_product() {
        assert!(check_product(&product(5, ProductStatus::Active), 2).is_ok());
        assert!(matches!(
            check_product(&product(1, ProductStatus::Active), 2),
            Err(OrderError::InsufficientStock {
                available: 1,
                requested: 2,
                ..
            })
        ));
        assert!(matches!(
            check_product(&product(5, ProductStatus::Inactive), 1),
            Err(OrderError::ProductUnavailable { .. })
        ));
        assert!(matches!(
            check_product(&product(0, ProductStatus::OutOfStock), 1),
            Err(OrderError::ProductUnavailable { .. })
        ));
    }
}
