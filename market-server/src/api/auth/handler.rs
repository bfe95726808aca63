//! Authentication Handlers
//!
//! Handles registration, login and the current-user lookup

use std::time::Duration;

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use shared::models::{AccountStatus, User, UserCreate, UserRole};

use crate::auth::{CurrentUser, hash_password, verify_password};
use crate::core::ServerState;
use crate::db::repository::user::{self, NewUser};
use crate::db::repository::RepoError;
use crate::security_log;
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_SHORT_TEXT_LEN, validate_email, validate_optional_text, validate_password,
    validate_required_text,
};
use crate::utils::{AppError, AppResult, ErrorCode};

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

/// Login payload
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token plus the authenticated account
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub token_type: &'static str,
    /// Seconds until the token expires
    pub expires_in: i64,
    pub user: User,
}

fn issue_token(state: &ServerState, user: User) -> AppResult<AuthResponse> {
    let jwt_service = state.get_jwt_service();
    let token = jwt_service
        .generate_token(user.id, &user.email, user.role)
        .map_err(|e| AppError::internal(format!("Failed to generate token: {}", e)))?;
    Ok(AuthResponse {
        token,
        token_type: "Bearer",
        expires_in: jwt_service.expires_in_seconds(),
        user,
    })
}

/// POST /api/auth/register - 注册 (买家或卖家)
pub async fn register(
    State(state): State<ServerState>,
    Json(req): Json<UserCreate>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    validate_required_text(&req.first_name, "first_name", MAX_NAME_LEN)?;
    validate_required_text(&req.last_name, "last_name", MAX_NAME_LEN)?;
    validate_email(&req.email)?;
    validate_password(&req.password)?;
    validate_optional_text(&req.phone, "phone", MAX_SHORT_TEXT_LEN)?;
    validate_optional_text(&req.shop_name, "shop_name", MAX_NAME_LEN)?;

    let role = req.role.unwrap_or_default();
    if role == UserRole::Admin {
        return Err(AppError::forbidden("Admin accounts cannot be self-registered"));
    }

    let password_hash = hash_password(&req.password)
        .map_err(|e| AppError::internal(format!("Failed to hash password: {}", e)))?;

    let created = user::create(
        state.get_pool(),
        NewUser {
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            email: req.email,
            password_hash,
            phone: req.phone,
            role,
            shop_name: req.shop_name,
        },
    )
    .await
    .map_err(|e| match e {
        RepoError::Duplicate(_) => {
            AppError::with_message(ErrorCode::EmailExists, "User already exists")
        }
        other => other.into(),
    })?;

    tracing::info!(user_id = created.id, role = created.role.as_str(), "User registered");

    Ok((StatusCode::CREATED, Json(issue_token(&state, created)?)))
}

/// POST /api/auth/login - 登录
///
/// Authenticates credentials and returns a JWT token
pub async fn login(
    State(state): State<ServerState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::validation("Please provide email and password"));
    }

    let found = user::find_by_email(state.get_pool(), &req.email).await?;

    // Fixed delay to prevent timing attacks (before checking result)
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    // Unified error message to prevent email enumeration
    let account = match found {
        Some(u) if verify_password(&req.password, &u.password_hash) => u,
        Some(u) => {
            security_log!(WARN, "login_failed", user_id = u.id, reason = "invalid_credentials");
            return Err(AppError::invalid_credentials());
        }
        None => {
            security_log!(WARN, "login_failed", reason = "user_not_found");
            return Err(AppError::invalid_credentials());
        }
    };

    match account.account_status {
        AccountStatus::Active => {}
        AccountStatus::Suspended => {
            security_log!(WARN, "login_rejected", user_id = account.id, reason = "suspended");
            return Err(AppError::new(ErrorCode::AccountSuspended));
        }
        AccountStatus::Deactivated => {
            security_log!(WARN, "login_rejected", user_id = account.id, reason = "deactivated");
            return Err(AppError::new(ErrorCode::AccountDeactivated));
        }
    }

    user::touch_last_login(state.get_pool(), account.id).await?;
    let account = user::find_by_id(state.get_pool(), account.id)
        .await?
        .ok_or_else(|| AppError::with_message(ErrorCode::UserNotFound, "User not found"))?;

    tracing::info!(user_id = account.id, role = account.role.as_str(), "User logged in");

    Ok(Json(issue_token(&state, account)?))
}

/// GET /api/auth/me - 当前用户
pub async fn me(State(state): State<ServerState>, current: CurrentUser) -> AppResult<Json<User>> {
    let account = user::find_by_id(state.get_pool(), current.id)
        .await?
        .ok_or_else(|| AppError::with_message(ErrorCode::UserNotFound, "User not found"))?;
    Ok(Json(account))
}
