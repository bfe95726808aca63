//! Review API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use shared::models::{Review, ReviewCreate, ReviewModerate, ReviewUpdate};

use crate::auth::{CurrentUser, MaybeUser};
use crate::core::ServerState;
use crate::reviews::HelpfulToggle;
use crate::utils::AppResult;

/// POST /api/reviews - 发表评价 (待审核)
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<ReviewCreate>,
) -> AppResult<(StatusCode, Json<Review>)> {
    let review = state.review_service().create(&current, payload).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// GET /api/reviews/mine - 我的评价
pub async fn list_mine(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<Vec<Review>>> {
    Ok(Json(state.review_service().list_mine(current.id).await?))
}

/// GET /api/reviews/:id - 单条评价 (未通过审核的仅作者和管理员可见)
pub async fn get_by_id(
    State(state): State<ServerState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Review>> {
    Ok(Json(state.review_service().get(id, viewer.as_ref()).await?))
}

/// PUT /api/reviews/:id - 修改自己的评价
pub async fn update(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<ReviewUpdate>,
) -> AppResult<Json<Review>> {
    Ok(Json(
        state.review_service().update(&current, id, payload).await?,
    ))
}

/// DELETE /api/reviews/:id - 删除评价 (作者或管理员)
pub async fn delete(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    state.review_service().delete(&current, id).await?;
    Ok(Json(true))
}

/// POST /api/reviews/:id/helpful - 切换"有帮助"标记
pub async fn toggle_helpful(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<HelpfulToggle>> {
    Ok(Json(
        state.review_service().toggle_helpful(&current, id).await?,
    ))
}

/// GET /api/reviews/pending - 待审核评价
pub async fn list_pending(State(state): State<ServerState>) -> AppResult<Json<Vec<Review>>> {
    Ok(Json(state.review_service().list_pending().await?))
}

/// PUT /api/reviews/:id/moderate - 审核 (approved | rejected)
pub async fn moderate(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<ReviewModerate>,
) -> AppResult<Json<Review>> {
    Ok(Json(
        state
            .review_service()
            .moderate(&current, id, payload)
            .await?,
    ))
}
