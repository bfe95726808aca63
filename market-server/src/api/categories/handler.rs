//! Category API Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use shared::models::{Category, CategoryCreate, CategoryUpdate};

use crate::audit_log;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{RepoError, category};
use crate::utils::validation::{
    MAX_DESCRIPTION_LEN, MAX_NAME_LEN, validate_optional_text, validate_required_text,
};
use crate::utils::{AppError, AppResult, ErrorCode};

fn category_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::CategoryNotFound, format!("Category {} not found", id))
        .with_detail("category_id", id)
}

fn map_write_error(err: RepoError, id: Option<i64>) -> AppError {
    match (err, id) {
        (RepoError::Duplicate(_), _) => {
            AppError::with_message(ErrorCode::CategoryNameExists, "Category already exists")
        }
        (RepoError::NotFound(_), Some(id)) => category_not_found(id),
        (other, _) => other.into(),
    }
}

/// GET /api/categories - 获取所有启用的分类
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<Vec<Category>>> {
    Ok(Json(category::find_all(state.get_pool()).await?))
}

/// GET /api/categories/:id - 获取单个分类
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Category>> {
    let found = category::find_by_id(state.get_pool(), id)
        .await?
        .ok_or_else(|| category_not_found(id))?;
    Ok(Json(found))
}

/// POST /api/categories - 创建分类 (slug 由名称生成)
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<CategoryCreate>,
) -> AppResult<Json<Category>> {
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_DESCRIPTION_LEN)?;
    if let Some(parent_id) = payload.parent_id
        && category::find_by_id(state.get_pool(), parent_id).await?.is_none()
    {
        return Err(category_not_found(parent_id));
    }

    let created = category::create(state.get_pool(), payload)
        .await
        .map_err(|e| map_write_error(e, None))?;
    audit_log!(current.id, "category_create", created.id);
    Ok(Json(created))
}

/// PUT /api/categories/:id - 更新分类
pub async fn update(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<CategoryUpdate>,
) -> AppResult<Json<Category>> {
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&payload.description, "description", MAX_DESCRIPTION_LEN)?;
    if payload.parent_id == Some(id) {
        return Err(AppError::validation("A category cannot be its own parent"));
    }

    let updated = category::update(state.get_pool(), id, payload)
        .await
        .map_err(|e| map_write_error(e, Some(id)))?;
    audit_log!(current.id, "category_update", id);
    Ok(Json(updated))
}

/// DELETE /api/categories/:id - 删除分类 (仍有商品时拒绝)
pub async fn delete(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    if category::has_products(state.get_pool(), id).await? {
        return Err(
            AppError::with_message(ErrorCode::CategoryHasProducts, "Category still has products")
                .with_detail("category_id", id),
        );
    }
    if !category::delete(state.get_pool(), id).await? {
        return Err(category_not_found(id));
    }
    audit_log!(current.id, "category_delete", id);
    Ok(Json(true))
}
