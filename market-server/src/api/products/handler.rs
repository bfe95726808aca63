//! Product API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use shared::models::{
    Product, ProductCreate, ProductQuery, ProductStatus, ProductUpdate, Review, ReviewQuery,
};

use crate::audit_log;
use crate::auth::{CurrentUser, MaybeUser};
use crate::core::ServerState;
use crate::db::repository::{RepoError, category, product};
use crate::pricing::money::validate_price;
use crate::reviews::ProductRatingStats;
use crate::utils::validation::{
    MAX_DESCRIPTION_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, MAX_URL_LEN, validate_optional_text,
    validate_required_text,
};
use crate::utils::{AppError, AppResult, ErrorCode, Page, PageWindow};

fn product_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::ProductNotFound, format!("Product {} not found", id))
        .with_detail("product_id", id)
}

fn validate_stock(stock: i64) -> AppResult<()> {
    if stock < 0 {
        return Err(AppError::validation(format!(
            "stock must be non-negative, got {}",
            stock
        )));
    }
    Ok(())
}

fn validate_urls(images: &[String]) -> AppResult<()> {
    for url in images {
        validate_required_text(url, "image", MAX_URL_LEN)?;
    }
    Ok(())
}

async fn ensure_category(state: &ServerState, category_id: Option<i64>) -> AppResult<()> {
    if let Some(id) = category_id
        && category::find_by_id(state.get_pool(), id).await?.is_none()
    {
        return Err(
            AppError::with_message(ErrorCode::CategoryNotFound, format!("Category {} not found", id))
                .with_detail("category_id", id),
        );
    }
    Ok(())
}

/// Load a product the caller may edit: its seller, or an admin
async fn load_owned(state: &ServerState, current: &CurrentUser, id: i64) -> AppResult<Product> {
    let found = product::find_by_id(state.get_pool(), id)
        .await?
        .ok_or_else(|| product_not_found(id))?;
    if found.seller_id != current.id && !current.is_admin() {
        return Err(AppError::forbidden("Not authorized to modify this product"));
    }
    Ok(found)
}

/// Only admins and the seller see non-active products
fn can_see_all(viewer: Option<&CurrentUser>, seller_id: i64) -> bool {
    viewer.is_some_and(|v| v.is_admin() || v.id == seller_id)
}

async fn list_page(state: &ServerState, query: &ProductQuery) -> AppResult<Page<Product>> {
    let window = PageWindow::new(query.page, query.limit);
    let (items, total) =
        product::list(state.get_pool(), query, window.limit, window.offset()).await?;
    Ok(Page::new(items, total, window))
}

/// GET /api/products - 商品列表 (分类/卖家/价格/标题搜索过滤)
pub async fn list(
    State(state): State<ServerState>,
    MaybeUser(viewer): MaybeUser,
    Query(mut query): Query<ProductQuery>,
) -> AppResult<Json<Page<Product>>> {
    let sees_all = match query.seller_id {
        Some(seller_id) => can_see_all(viewer.as_ref(), seller_id),
        None => viewer.as_ref().is_some_and(CurrentUser::is_admin),
    };
    if !sees_all {
        query.status = Some(ProductStatus::Active);
    }
    Ok(Json(list_page(&state, &query).await?))
}

/// GET /api/products/mine - 当前卖家的商品 (含下架)
pub async fn list_mine(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(mut query): Query<ProductQuery>,
) -> AppResult<Json<Page<Product>>> {
    query.seller_id = Some(current.id);
    Ok(Json(list_page(&state, &query).await?))
}

/// GET /api/products/:id - 获取单个商品
pub async fn get_by_id(
    State(state): State<ServerState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Product>> {
    let found = product::find_by_id(state.get_pool(), id)
        .await?
        .ok_or_else(|| product_not_found(id))?;
    if found.status == ProductStatus::Inactive && !can_see_all(viewer.as_ref(), found.seller_id) {
        return Err(product_not_found(id));
    }
    Ok(Json(found))
}

/// POST /api/products - 创建商品
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<ProductCreate>,
) -> AppResult<Json<Product>> {
    validate_required_text(&payload.title, "title", MAX_NAME_LEN)?;
    validate_required_text(&payload.description, "description", MAX_DESCRIPTION_LEN)?;
    validate_price(payload.price, "price")?;
    if let Some(compare_price) = payload.compare_price {
        validate_price(compare_price, "compare_price")?;
    }
    validate_stock(payload.stock)?;
    validate_optional_text(&payload.sku, "sku", MAX_SHORT_TEXT_LEN)?;
    validate_urls(&payload.images)?;
    ensure_category(&state, payload.category_id).await?;

    let created = product::create(state.get_pool(), current.id, payload).await?;
    tracing::info!(
        product_id = created.id,
        seller_id = current.id,
        stock = created.stock,
        "Product created"
    );
    Ok(Json(created))
}

/// PUT /api/products/:id - 更新商品 (仅本人或管理员)
pub async fn update(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<Json<Product>> {
    if let Some(title) = &payload.title {
        validate_required_text(title, "title", MAX_NAME_LEN)?;
    }
    validate_optional_text(&payload.description, "description", MAX_DESCRIPTION_LEN)?;
    if let Some(price) = payload.price {
        validate_price(price, "price")?;
    }
    if let Some(compare_price) = payload.compare_price {
        validate_price(compare_price, "compare_price")?;
    }
    if let Some(stock) = payload.stock {
        validate_stock(stock)?;
    }
    validate_optional_text(&payload.sku, "sku", MAX_SHORT_TEXT_LEN)?;
    if let Some(images) = &payload.images {
        validate_urls(images)?;
    }
    ensure_category(&state, payload.category_id).await?;

    let existing = load_owned(&state, &current, id).await?;
    let updated = product::update(state.get_pool(), id, payload)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => product_not_found(id),
            other => other.into(),
        })?;

    if existing.seller_id != current.id {
        audit_log!(current.id, "product_update", id);
    }
    Ok(Json(updated))
}

/// DELETE /api/products/:id - 删除商品
///
/// 已被订单引用的商品不能删除，只能下架 (status = inactive)
pub async fn delete(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let existing = load_owned(&state, &current, id).await?;
    if product::is_referenced_by_orders(state.get_pool(), id).await? {
        return Err(AppError::with_message(
            ErrorCode::ProductInUse,
            "Product is referenced by orders; set it inactive instead",
        )
        .with_detail("product_id", id));
    }
    if !product::delete(state.get_pool(), id).await? {
        return Err(product_not_found(id));
    }

    tracing::info!(product_id = id, seller_id = existing.seller_id, "Product deleted");
    if existing.seller_id != current.id {
        audit_log!(current.id, "product_delete", id);
    }
    Ok(Json(true))
}

/// GET /api/products/:id/reviews - 已审核的商品评价
pub async fn list_reviews(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
    Query(query): Query<ReviewQuery>,
) -> AppResult<Json<Page<Review>>> {
    Ok(Json(state.review_service().list_for_product(id, &query).await?))
}

/// GET /api/products/:id/reviews/distribution - 评分分布
pub async fn rating_distribution(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ProductRatingStats>> {
    Ok(Json(state.review_service().rating_stats(id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::UserRole;

    fn user(id: i64, role: UserRole) -> CurrentUser {
        CurrentUser {
            id,
            email: format!("u{id}@example.com"),
            role,
        }
    }

    #[test]
    fn test_visibility_of_hidden_products() {
        assert!(!can_see_all(None, 7));
        assert!(can_see_all(Some(&user(7, UserRole::Seller)), 7));
        assert!(!can_see_all(Some(&user(8, UserRole::Seller)), 7));
        assert!(can_see_all(Some(&user(1, UserRole::Admin)), 7));
    }

    #[test]
    fn test_negative_stock_rejected() {
        assert!(validate_stock(-1).is_err());
        assert!(validate_stock(0).is_ok());
    }
}
