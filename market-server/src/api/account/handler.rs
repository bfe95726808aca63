//! Account API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use shared::models::{
    AccountStatus, Address, AddressInput, Product, SellerApplicationCreate,
    SellerApplicationState, SellerApplicationStatus, User, UserUpdate,
};

use crate::audit_log;
use crate::notifications;
use crate::auth::{CurrentUser, hash_password, verify_password};
use crate::core::ServerState;
use crate::db::repository::{RepoError, address, product, user, wishlist};
use crate::utils::validation::{
    MAX_DESCRIPTION_LEN, MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_address,
    validate_optional_text, validate_password, validate_required_text,
};
use crate::utils::{AppError, AppResult, ErrorCode};

/// Change password payload
#[derive(Debug, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

/// Approved application plus a token carrying the new seller role
#[derive(Debug, Serialize)]
pub struct SellerUpgrade {
    pub application: SellerApplicationState,
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// Admin account status payload
#[derive(Debug, Deserialize)]
pub struct AccountStatusUpdate {
    pub status: AccountStatus,
}

fn address_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::AddressNotFound, format!("Address {id} not found"))
        .with_detail("address_id", id)
}

async fn load_user(state: &ServerState, id: i64) -> AppResult<User> {
    user::find_by_id(state.get_pool(), id)
        .await?
        .ok_or_else(|| AppError::with_message(ErrorCode::UserNotFound, "User not found"))
}

/// GET /api/users/profile - 当前用户资料
pub async fn get_profile(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<User>> {
    Ok(Json(load_user(&state, current.id).await?))
}

/// PUT /api/users/profile - 更新资料
pub async fn update_profile(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<UserUpdate>,
) -> AppResult<Json<User>> {
    for (value, field) in [
        (&payload.first_name, "first_name"),
        (&payload.last_name, "last_name"),
        (&payload.shop_name, "shop_name"),
    ] {
        validate_optional_text(value, field, MAX_NAME_LEN)?;
    }
    validate_optional_text(&payload.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&payload.shop_description, "shop_description", MAX_DESCRIPTION_LEN)?;

    let updated = user::update_profile(state.get_pool(), current.id, payload).await?;
    Ok(Json(updated))
}

/// PUT /api/users/change-password - 修改密码
pub async fn change_password(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<PasswordChange>,
) -> AppResult<Json<bool>> {
    validate_password(&payload.new_password)?;

    let account = load_user(&state, current.id).await?;
    if !verify_password(&payload.current_password, &account.password_hash) {
        return Err(AppError::with_message(
            ErrorCode::InvalidCredentials,
            "Current password is incorrect",
        ));
    }

    let hash = hash_password(&payload.new_password)
        .map_err(|e| AppError::internal(format!("Failed to hash password: {}", e)))?;
    user::update_password(state.get_pool(), current.id, &hash).await?;

    tracing::info!(user_id = current.id, "Password changed");
    Ok(Json(true))
}

/// GET /api/users/addresses - 收货地址列表
pub async fn list_addresses(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<Vec<Address>>> {
    Ok(Json(address::find_by_user(state.get_pool(), current.id).await?))
}

/// POST /api/users/addresses - 新增地址 (首个地址自动成为默认)
pub async fn add_address(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<AddressInput>,
) -> AppResult<Json<Address>> {
    validate_address(&payload.address)?;
    let created = address::create(state.get_pool(), current.id, payload).await?;
    Ok(Json(created))
}

/// PUT /api/users/addresses/:id - 更新地址
pub async fn update_address(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<AddressInput>,
) -> AppResult<Json<Address>> {
    validate_address(&payload.address)?;
    let updated = address::update(state.get_pool(), current.id, id, payload)
        .await
        .map_err(|e| match e {
            RepoError::NotFound(_) => address_not_found(id),
            other => other.into(),
        })?;
    Ok(Json(updated))
}

/// DELETE /api/users/addresses/:id - 删除地址
pub async fn delete_address(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    if !address::delete(state.get_pool(), current.id, id).await? {
        return Err(address_not_found(id));
    }
    Ok(Json(true))
}

/// GET /api/users/wishlist - 收藏夹
pub async fn list_wishlist(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<Vec<Product>>> {
    Ok(Json(wishlist::find_by_user(state.get_pool(), current.id).await?))
}

/// POST /api/users/wishlist/:product_id - 加入收藏 (幂等)
pub async fn add_to_wishlist(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(product_id): Path<i64>,
) -> AppResult<Json<Vec<Product>>> {
    if product::find_by_id(state.get_pool(), product_id).await?.is_none() {
        return Err(AppError::with_message(
            ErrorCode::ProductNotFound,
            format!("Product {product_id} not found"),
        ));
    }
    wishlist::add(state.get_pool(), current.id, product_id).await?;
    Ok(Json(wishlist::find_by_user(state.get_pool(), current.id).await?))
}

/// DELETE /api/users/wishlist/:product_id - 移出收藏
pub async fn remove_from_wishlist(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(product_id): Path<i64>,
) -> AppResult<Json<Vec<Product>>> {
    wishlist::remove(state.get_pool(), current.id, product_id).await?;
    Ok(Json(wishlist::find_by_user(state.get_pool(), current.id).await?))
}

/// PUT /api/users/:id/status - 管理员冻结/恢复账号
pub async fn set_account_status(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<AccountStatusUpdate>,
) -> AppResult<Json<User>> {
    if id == current.id {
        return Err(AppError::validation("Cannot change the status of your own account"));
    }
    if !user::set_status(state.get_pool(), id, payload.status).await? {
        return Err(AppError::with_message(ErrorCode::UserNotFound, "User not found"));
    }
    let status = match payload.status {
        AccountStatus::Active => "active",
        AccountStatus::Suspended => "suspended",
        AccountStatus::Deactivated => "deactivated",
    };
    audit_log!(current.id, "account_status", id, status);
    Ok(Json(load_user(&state, id).await?))
}

async fn seller_application_state(state: &ServerState, account: &User) -> AppResult<SellerApplicationState> {
    let application = user::find_seller_application(state.get_pool(), account.id).await?;
    Ok(match application {
        Some(app) => SellerApplicationState {
            role: account.role,
            fee_paid: true,
            fee_amount: app.fee_amount,
            paid_at: Some(app.paid_at),
            status: app.status,
        },
        None => SellerApplicationState {
            role: account.role,
            fee_paid: false,
            fee_amount: state.config.seller_application_fee,
            paid_at: None,
            status: SellerApplicationStatus::Pending,
        },
    })
}

/// GET /api/users/seller-application - 卖家申请状态
pub async fn get_seller_application(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<SellerApplicationState>> {
    let account = load_user(&state, current.id).await?;
    Ok(Json(seller_application_state(&state, &account).await?))
}

/// POST /api/users/seller-application - 支付申请费并升级为卖家
///
/// 申请费到账即批准；旧 token 的角色已过期，响应里带新 token。
pub async fn apply_for_seller(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<SellerApplicationCreate>,
) -> AppResult<Json<SellerUpgrade>> {
    validate_required_text(&payload.payment_method, "payment_method", MAX_SHORT_TEXT_LEN)?;
    validate_required_text(&payload.transaction_id, "transaction_id", MAX_SHORT_TEXT_LEN)?;

    let fee = state.config.seller_application_fee;
    user::approve_seller_application(state.get_pool(), current.id, fee, &payload)
        .await
        .map_err(|e| match e {
            RepoError::Duplicate(_) => AppError::new(ErrorCode::SellerApplicationExists),
            other => other.into(),
        })?;

    let account = load_user(&state, current.id).await?;
    audit_log!(current.id, "seller_apply", payload.transaction_id.trim(), fee);
    tracing::info!(user_id = current.id, "Buyer upgraded to seller");
    notifications::seller_approved(state.get_pool(), current.id).await;

    let jwt_service = state.get_jwt_service();
    let token = jwt_service
        .generate_token(account.id, &account.email, account.role)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))?;
    Ok(Json(SellerUpgrade {
        application: seller_application_state(&state, &account).await?,
        token,
        token_type: "Bearer",
        expires_in: jwt_service.expires_in_seconds(),
    }))
}
