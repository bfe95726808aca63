//! Notification API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Serialize;
use shared::models::{Notification, NotificationQuery};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::notification;
use crate::utils::{AppError, AppResult, ErrorCode, Page, PageWindow};

/// Unread badge
#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub unread: i64,
}

/// Rows touched by mark-all-read
#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub updated: u64,
}

fn notification_not_found(id: i64) -> AppError {
    AppError::with_message(
        ErrorCode::NotificationNotFound,
        format!("Notification {} not found", id),
    )
    .with_detail("notification_id", id)
}

/// GET /api/notifications - 通知列表 (unread_only 过滤)
pub async fn list(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<NotificationQuery>,
) -> AppResult<Json<Page<Notification>>> {
    let window = PageWindow::new(query.page, query.limit);
    let (items, total) = notification::list(
        state.get_pool(),
        current.id,
        query.unread_only,
        window.limit,
        window.offset(),
    )
    .await?;
    Ok(Json(Page::new(items, total, window)))
}

/// GET /api/notifications/unread-count - 未读数
pub async fn unread_count(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<UnreadCount>> {
    let unread = notification::unread_count(state.get_pool(), current.id).await?;
    Ok(Json(UnreadCount { unread }))
}

/// PUT /api/notifications/:id/read - 标记已读
pub async fn mark_read(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    if !notification::mark_read(state.get_pool(), current.id, id).await? {
        return Err(notification_not_found(id));
    }
    Ok(Json(true))
}

/// PUT /api/notifications/read-all - 全部标记已读
pub async fn mark_all_read(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<MarkedRead>> {
    let updated = notification::mark_all_read(state.get_pool(), current.id).await?;
    Ok(Json(MarkedRead { updated }))
}

/// DELETE /api/notifications/:id - 删除通知
pub async fn delete(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    if !notification::delete(state.get_pool(), current.id, id).await? {
        return Err(notification_not_found(id));
    }
    Ok(Json(true))
}
