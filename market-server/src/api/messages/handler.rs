//! Messaging API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Serialize;
use shared::models::{
    Conversation, ConversationOpen, ConversationSummary, Message, MessageCreate, MessageQuery,
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{message, product, user};
use crate::notifications;
use crate::utils::validation::{
    MAX_ATTACHMENTS, MAX_MESSAGE_LEN, MAX_NAME_LEN, MAX_URL_LEN, validate_optional_text,
    validate_required_text,
};
use crate::utils::{AppError, AppResult, ErrorCode, Page, PageWindow};

/// 消息列表默认每页条数
const MESSAGE_PAGE_SIZE: u32 = 50;

/// Messages stamped read
#[derive(Debug, Serialize)]
pub struct MarkedRead {
    pub updated: u64,
}

fn conversation_not_found(id: i64) -> AppError {
    AppError::with_message(
        ErrorCode::ConversationNotFound,
        format!("Conversation {id} not found"),
    )
    .with_detail("conversation_id", id)
}

fn message_not_found(id: i64) -> AppError {
    AppError::with_message(ErrorCode::MessageNotFound, format!("Message {id} not found"))
        .with_detail("message_id", id)
}

/// Conversation the caller takes part in
async fn load_conversation(
    state: &ServerState,
    id: i64,
    current: &CurrentUser,
) -> AppResult<Conversation> {
    let conversation = message::find_conversation(state.get_pool(), id)
        .await?
        .ok_or_else(|| conversation_not_found(id))?;
    if !conversation.has_participant(current.id) {
        return Err(AppError::forbidden(
            "You are not a participant of this conversation",
        ));
    }
    Ok(conversation)
}

fn validate_message(payload: &MessageCreate) -> AppResult<()> {
    validate_required_text(&payload.content, "content", MAX_MESSAGE_LEN)?;
    if payload.attachments.len() > MAX_ATTACHMENTS {
        return Err(AppError::validation(format!(
            "at most {MAX_ATTACHMENTS} attachments per message"
        )));
    }
    for attachment in &payload.attachments {
        validate_required_text(&attachment.url, "attachments.url", MAX_URL_LEN)?;
        validate_optional_text(&attachment.name, "attachments.name", MAX_NAME_LEN)?;
    }
    Ok(())
}

/// POST /api/messages/conversations - 打开或创建会话 (可关联商品)
pub async fn open_conversation(
    State(state): State<ServerState>,
    current: CurrentUser,
    Json(payload): Json<ConversationOpen>,
) -> AppResult<Json<ConversationSummary>> {
    if payload.participant_id == current.id {
        return Err(AppError::with_message(
            ErrorCode::ConversationInvalidParticipant,
            "Cannot start a conversation with yourself",
        ));
    }
    let pool = state.get_pool();
    if user::find_by_id(pool, payload.participant_id).await?.is_none() {
        return Err(AppError::with_message(ErrorCode::UserNotFound, "User not found")
            .with_detail("user_id", payload.participant_id));
    }
    if let Some(product_id) = payload.product_id
        && product::find_by_id(pool, product_id).await?.is_none()
    {
        return Err(AppError::with_message(
            ErrorCode::ProductNotFound,
            format!("Product {product_id} not found"),
        ));
    }

    let conversation =
        message::open_conversation(pool, current.id, payload.participant_id, payload.product_id)
            .await?;
    let summary = message::find_summary(pool, current.id, conversation.id)
        .await?
        .ok_or_else(|| conversation_not_found(conversation.id))?;
    Ok(Json(summary))
}

/// GET /api/messages/conversations - 我的会话 (最近活跃在前，含未读数)
pub async fn list_conversations(
    State(state): State<ServerState>,
    current: CurrentUser,
) -> AppResult<Json<Vec<ConversationSummary>>> {
    Ok(Json(
        message::list_summaries(state.get_pool(), current.id).await?,
    ))
}

/// POST /api/messages/:id - 发送消息
pub async fn send_message(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<MessageCreate>,
) -> AppResult<(StatusCode, Json<Message>)> {
    validate_message(&payload)?;
    let conversation = load_conversation(&state, id, &current).await?;

    let pool = state.get_pool();
    let sent = message::send(pool, conversation.id, current.id, &payload).await?;
    tracing::debug!(
        conversation_id = conversation.id,
        message_id = sent.id,
        sender_id = current.id,
        "Message sent"
    );

    let sender_name = match user::find_by_id(pool, current.id).await {
        Ok(Some(sender)) => sender.full_name(),
        _ => current.email.clone(),
    };
    notifications::message_received(
        pool,
        conversation.other_participant(current.id),
        &sender_name,
        &sent,
    )
    .await;

    Ok((StatusCode::CREATED, Json(sent)))
}

/// GET /api/messages/:id - 会话消息 (按页，页内从旧到新)
pub async fn list_messages(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
    Query(query): Query<MessageQuery>,
) -> AppResult<Json<Page<Message>>> {
    let conversation = load_conversation(&state, id, &current).await?;
    let window = PageWindow::new(query.page, Some(query.limit.unwrap_or(MESSAGE_PAGE_SIZE)));
    let (items, total) =
        message::list_messages(state.get_pool(), conversation.id, window.limit, window.offset())
            .await?;
    Ok(Json(Page::new(items, total, window)))
}

/// PUT /api/messages/:id/read - 标记会话已读
pub async fn mark_read(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<MarkedRead>> {
    let conversation = load_conversation(&state, id, &current).await?;
    let updated = message::mark_read(state.get_pool(), conversation.id, current.id).await?;
    Ok(Json(MarkedRead { updated }))
}

/// DELETE /api/messages/:id - 撤回自己发送的消息
pub async fn delete_message(
    State(state): State<ServerState>,
    current: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<bool>> {
    let existing = message::find_message(state.get_pool(), id)
        .await?
        .filter(|m| !m.is_deleted)
        .ok_or_else(|| message_not_found(id))?;
    if existing.sender_id != current.id {
        return Err(AppError::forbidden("Only the sender can delete this message"));
    }
    if !message::soft_delete(state.get_pool(), id, current.id).await? {
        return Err(message_not_found(id));
    }
    Ok(Json(true))
}
