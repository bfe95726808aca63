//! Coupon API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use shared::models::{
    Coupon, CouponCreate, CouponQuote, CouponUpdate, CouponValidate, DiscountType,
};

use crate::audit_log;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{RepoError, coupon, product};
use crate::pricing::coupon::{self as coupon_calc, CartProduct};
use crate::pricing::money::{require_finite, to_decimal, validate_price};
use crate::utils::validation::{MAX_NOTE_LEN, MAX_SHORT_TEXT_LEN, validate_required_text};
use crate::utils::{AppError, AppResult, ErrorCode};

fn coupon_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::CouponNotFound, format!("Coupon {} not found", id))
        .with_detail("coupon_id", id)
}

/// Shared numeric rules for create and update
fn validate_terms(
    discount_type: DiscountType,
    discount_value: Option<f64>,
    max_discount_amount: Option<f64>,
    min_purchase_amount: Option<f64>,
) -> AppResult<()> {
    if let Some(value) = discount_value {
        require_finite(value, "discount_value")?;
        if value <= 0.0 {
            return Err(AppError::validation("discount_value must be positive"));
        }
        if discount_type == DiscountType::Percentage && value > 100.0 {
            return Err(AppError::validation(
                "percentage discount cannot exceed 100",
            ));
        }
    }
    if let Some(max) = max_discount_amount {
        validate_price(max, "max_discount_amount")?;
    }
    if let Some(min) = min_purchase_amount {
        validate_price(min, "min_purchase_amount")?;
    }
    Ok(())
}

fn validate_limits(usage_limit: Option<i64>, user_usage_limit: Option<i64>) -> AppResult<()> {
    if usage_limit.is_some_and(|l| l < 1) {
        return Err(AppError::validation("usage_limit must be at least 1"));
    }
    if user_usage_limit.is_some_and(|l| l < 1) {
        return Err(AppError::validation("user_usage_limit must be at least 1"));
    }
    Ok(())
}

fn validate_window(start: i64, expiry: i64) -> AppResult<()> {
    if expiry <= start {
        return Err(AppError::validation("expiry_date must be after start_date"));
    }
    Ok(())
}

/// Sellers manage only the coupons they created
async fn load_managed(state: &ServerState, current: &CurrentUser, id: i64) -> AppResult<Coupon> {
    let found = coupon::find_by_id(state.get_pool(), id)
        .await?
        .ok_or_else(|| coupon_not_found(id))?;
    if !current.is_admin() && found.created_by != current.id {
        return Err(AppError::forbidden("Not authorized to manage this coupon"));
    }
    Ok(found)
}

/// POST /api/coupons/validate - 校验优惠券并返回折扣 (不记录使用)
pub async fn validate(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<CouponValidate>,
) -> AppResult<Json<CouponQuote>> {
    validate_price(payload.order_amount, "order_amount")?;

    let found = coupon::find_by_code(state.get_pool(), &payload.code)
        .await?
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::CouponNotFound, "Invalid coupon code")
                .with_detail("code", payload.code.clone())
        })?;
    let usage = coupon::find_usage(state.get_pool(), found.id, current.id).await?;

    let mut products = Vec::with_capacity(payload.product_ids.len());
    for product_id in &payload.product_ids {
        let p = product::find_by_id(state.get_pool(), *product_id)
            .await?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::ProductNotFound,
                    format!("Product {} not found", product_id),
                )
            })?;
        products.push(CartProduct {
            product_id: p.id,
            category_id: p.category_id,
        });
    }

    let quote = coupon_calc::quote(
        &found,
        usage.as_ref(),
        to_decimal(payload.order_amount),
        &products,
        shared::util::now_millis(),
    )?;
    Ok(Json(quote))
}

/// GET /api/coupons - 优惠券列表 (卖家只看到自己的)
pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<Vec<Coupon>>> {
    let owner = (!current.is_admin()).then_some(current.id);
    Ok(Json(coupon::list(state.get_pool(), owner).await?))
}

/// GET /api/coupons/:id - 获取单个优惠券
pub async fn get_by_id(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Coupon>> {
    Ok(Json(load_managed(&state, &current, id).await?))
}

/// POST /api/coupons - 创建优惠券
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<CouponCreate>,
) -> AppResult<(StatusCode, Json<Coupon>)> {
    validate_required_text(&payload.code, "code", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&payload.description, "description", MAX_NOTE_LEN)?;
    validate_terms(
        payload.discount_type,
        Some(payload.discount_value),
        payload.max_discount_amount,
        payload.min_purchase_amount,
    )?;
    validate_limits(payload.usage_limit, payload.user_usage_limit)?;
    let start = payload.start_date.unwrap_or_else(shared::util::now_millis);
    validate_window(start, payload.expiry_date)?;

    let created = coupon::create(state.get_pool(), current.id, payload)
        .await
        .map_err(|e| match e {
            RepoError::Duplicate(_) => {
                AppError::with_message(ErrorCode::CouponCodeExists, "Coupon code already exists")
            }
            other => other.into(),
        })?;

    tracing::info!(
        coupon_id = created.id,
        code = %created.code,
        created_by = current.id,
        "Coupon created"
    );
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/coupons/:id - 更新优惠券 (code 不可修改)
pub async fn update(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<CouponUpdate>,
) -> AppResult<Json<Coupon>> {
    let existing = load_managed(&state, &current, id).await?;

    if let Some(description) = &payload.description {
        validate_required_text(description, "description", MAX_NOTE_LEN)?;
    }
    validate_terms(
        existing.discount_type,
        payload.discount_value,
        payload.max_discount_amount,
        payload.min_purchase_amount,
    )?;
    validate_limits(payload.usage_limit, payload.user_usage_limit)?;
    validate_window(
        payload.start_date.unwrap_or(existing.start_date),
        payload.expiry_date.unwrap_or(existing.expiry_date),
    )?;

    let updated = coupon::update(state.get_pool(), id, payload)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => coupon_not_found(id),
            other => other.into(),
        })?;
    if existing.created_by != current.id {
        audit_log!(current.id, "coupon_update", id);
    }
    Ok(Json(updated))
}

/// DELETE /api/coupons/:id - 删除优惠券
pub async fn delete(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let existing = load_managed(&state, &current, id).await?;
    if !coupon::delete(state.get_pool(), id).await? {
        return Err(coupon_not_found(id));
    }
    if existing.created_by != current.id {
        audit_log!(current.id, "coupon_delete", id);
    }
    Ok(Json(true))
}
