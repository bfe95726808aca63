//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use shared::models::{Order, OrderCancel, OrderCreate, OrderQuery, OrderStatusUpdate};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::{AppResult, Page};

/// POST /api/orders - 下单
///
/// 库存扣减、订单写入、优惠券计数在同一事务中完成
pub async fn create(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<OrderCreate>,
) -> AppResult<(StatusCode, Json<Order>)> {
    let order = state.order_service().create(current.id, payload).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/orders - 当前买家的订单
pub async fn list_mine(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<OrderQuery>,
) -> AppResult<Json<Page<Order>>> {
    Ok(Json(
        state.order_service().list_for_buyer(current.id, &query).await?,
    ))
}

/// GET /api/orders/:id - 订单详情 (买家、相关卖家或管理员)
pub async fn get_by_id(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Order>> {
    Ok(Json(state.order_service().get(id, &current).await?))
}

/// PUT /api/orders/:id/cancel - 买家取消 (仅 pending)
pub async fn cancel(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<OrderCancel>,
) -> AppResult<Json<Order>> {
    Ok(Json(
        state
            .order_service()
            .cancel(id, &current, payload.reason)
            .await?,
    ))
}

/// PUT /api/orders/:id/status - 更新订单状态 (卖家或管理员)
pub async fn update_status(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<OrderStatusUpdate>,
) -> AppResult<Json<Order>> {
    Ok(Json(
        state
            .order_service()
            .update_status(id, &current, payload)
            .await?,
    ))
}

/// GET /api/orders/seller/mine - 包含当前卖家商品的订单
pub async fn list_for_seller(
    State(state): State<ServerState>,
    current: CurrentUser,
    Query(query): Query<OrderQuery>,
) -> AppResult<Json<Page<Order>>> {
    Ok(Json(
        state
            .order_service()
            .list_for_seller(current.id, &query)
            .await?,
    ))
}

/// GET /api/orders/admin/all - 全部订单 (可按状态过滤)
pub async fn list_all(
    State(state): State<ServerState>,
    Query(query): Query<OrderQuery>,
) -> AppResult<Json<Page<Order>>> {
    Ok(Json(state.order_service().list_all(&query).await?))
}
