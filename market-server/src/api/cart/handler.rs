//! Cart API Handlers
//!
//! Quantities are checked against live stock on every write; the order
//! engine checks again when the cart is turned into an order.

use axum::{
    Json,
    extract::{Path, State},
};
use rust_decimal::Decimal;
use shared::models::{Cart, CartAdd, CartItem, CartUpdate, Product};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{RepoError, cart, product};
use crate::pricing::line_total;
use crate::pricing::money::{to_f64, validate_quantity};
use crate::utils::{AppError, AppResult, ErrorCode};

/// Subtotal over lines whose product is still on sale
fn build_cart(items: Vec<CartItem>) -> Cart {
    let subtotal: Decimal = items
        .iter()
        .filter(|i| i.status == shared::models::ProductStatus::Active)
        .map(|i| line_total(i.price, i.quantity))
        .sum();
    Cart {
        items,
        subtotal: to_f64(subtotal),
    }
}

async fn load_cart(state: &ServerState, user_id: i64) -> AppResult<Cart> {
    let items = cart::find_by_user(state.get_pool(), user_id).await?;
    Ok(build_cart(items))
}

/// Product must be on sale with at least `quantity` units left
async fn check_available(state: &ServerState, product_id: i64, quantity: i64) -> AppResult<Product> {
    let found = product::find_by_id(state.get_pool(), product_id)
        .await?
        .ok_or_else(|| {
            AppError::with_message(
                ErrorCode::ProductNotFound,
                format!("Product {} not found", product_id),
            )
        })?;
    if !found.is_active() {
        return Err(AppError::with_message(
            ErrorCode::ProductUnavailable,
            format!("Product is not available: {}", found.title),
        )
        .with_detail("product_id", product_id));
    }
    if found.stock < quantity {
        return Err(AppError::with_message(
            ErrorCode::ProductOutOfStock,
            format!("Insufficient stock for product: {}", found.title),
        )
        .with_detail("product_id", product_id)
        .with_detail("available", found.stock)
        .with_detail("requested", quantity));
    }
    Ok(found)
}

fn item_not_found(product_id: i64) -> AppError {
    AppError::with_message(ErrorCode::CartItemNotFound, "Item not found in cart")
        .with_detail("product_id", product_id)
}

/// GET /api/cart - 购物车
pub async fn get_cart(State(state): State<ServerState>, current: CurrentUser) -> AppResult<Json<Cart>> {
    Ok(Json(load_cart(&state, current.id).await?))
}

/// POST /api/cart - 加入购物车 (同一商品累加数量)
pub async fn add_item(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<CartAdd>,
) -> AppResult<Json<Cart>> {
    validate_quantity(payload.quantity)?;
    let in_cart = cart::quantity_of(state.get_pool(), current.id, payload.product_id).await?;
    let wanted = in_cart + payload.quantity;
    validate_quantity(wanted)?;
    check_available(&state, payload.product_id, wanted).await?;

    cart::add(state.get_pool(), current.id, payload.product_id, payload.quantity).await?;
    Ok(Json(load_cart(&state, current.id).await?))
}

/// PUT /api/cart/:product_id - 修改数量
pub async fn update_item(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(product_id): Path<i64>,
    Json(payload): Json<CartUpdate>,
) -> AppResult<Json<Cart>> {
    validate_quantity(payload.quantity)?;
    check_available(&state, product_id, payload.quantity).await?;

    if !cart::set_quantity(state.get_pool(), current.id, product_id, payload.quantity).await? {
        return Err(item_not_found(product_id));
    }
    Ok(Json(load_cart(&state, current.id).await?))
}

/// DELETE /api/cart/:product_id - 移除商品
pub async fn remove_item(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(product_id): Path<i64>,
) -> AppResult<Json<Cart>> {
    if !cart::remove(state.get_pool(), current.id, product_id).await? {
        return Err(item_not_found(product_id));
    }
    Ok(Json(load_cart(&state, current.id).await?))
}

/// DELETE /api/cart - 清空购物车
pub async fn clear(State(state): State<ServerState>, current: CurrentUser) -> AppResult<Json<Cart>> {
    let mut conn = state
        .get_pool()
        .acquire()
        .await
        .map_err(RepoError::from)?;
    let removed = cart::clear(&mut conn, current.id).await?;
    tracing::debug!(user_id = current.id, removed, "Cart cleared");
    Ok(Json(Cart {
        items: Vec::new(),
        subtotal: 0.0,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::ProductStatus;

    fn item(price: f64, quantity: i64, status: ProductStatus) -> CartItem {
        CartItem {
            product_id: 1,
            quantity,
            added_at: 0,
            title: "Mug".into(),
            price,
            stock: 10,
            status,
        }
    }

    #[test]
    fn test_subtotal_skips_unavailable_products() {
        let cart = build_cart(vec![
            item(10.0, 2, ProductStatus::Active),
            item(15.5, 1, ProductStatus::Active),
            item(99.0, 1, ProductStatus::Inactive),
            item(5.0, 3, ProductStatus::OutOfStock),
        ]);
        assert_eq!(cart.items.len(), 4);
        assert_eq!(cart.subtotal, 35.5);
    }

    #[test]
    fn test_empty_cart() {
        assert_eq!(build_cart(Vec::new()).subtotal, 0.0);
    }
}
