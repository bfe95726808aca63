//! Conversation / Message Repository

use super::{RepoError, RepoResult};
use shared::models::{Conversation, ConversationSummary, Message, MessageCreate};
use sqlx::SqlitePool;
use sqlx::types::Json;

const CONVERSATION_SELECT: &str = "SELECT id, participant_a, participant_b, product_id, last_message_id, unread_a, unread_b, created_at, updated_at FROM conversation";

const MESSAGE_SELECT: &str = "SELECT id, conversation_id, sender_id, content, message_type, attachments, is_deleted, read_at, created_at, updated_at FROM message";

/// Conversation columns resolved for viewer `?1`
const SUMMARY_SELECT: &str = "SELECT c.id, \
        u.id AS other_user_id, u.first_name AS other_first_name, u.last_name AS other_last_name, u.shop_name AS other_shop_name, \
        c.product_id, p.title AS product_title, \
        m.content AS last_message, m.sender_id AS last_sender_id, m.created_at AS last_message_at, \
        CASE WHEN c.participant_a = ?1 THEN c.unread_a ELSE c.unread_b END AS my_unread_count, \
        c.updated_at \
    FROM conversation c \
    JOIN users u ON u.id = CASE WHEN c.participant_a = ?1 THEN c.participant_b ELSE c.participant_a END \
    LEFT JOIN product p ON p.id = c.product_id \
    LEFT JOIN message m ON m.id = c.last_message_id";

/// Replacement text of a deleted message
pub const DELETED_PLACEHOLDER: &str = "This message was deleted";

/// Storage order of a participant pair
pub fn ordered_pair(a: i64, b: i64) -> (i64, i64) {
    if a < b { (a, b) } else { (b, a) }
}

pub async fn find_conversation(pool: &SqlitePool, id: i64) -> RepoResult<Option<Conversation>> {
    let sql = format!("{CONVERSATION_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Conversation>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Get-or-create; concurrent opens of the same pair and product land on one row
pub async fn open_conversation(
    pool: &SqlitePool,
    user_id: i64,
    participant_id: i64,
    product_id: Option<i64>,
) -> RepoResult<Conversation> {
    let (a, b) = ordered_pair(user_id, participant_id);
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO conversation (id, participant_a, participant_b, product_id, unread_a, unread_b, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, 0, 0, ?5, ?5) ON CONFLICT DO NOTHING",
    )
    .bind(shared::util::snowflake_id())
    .bind(a)
    .bind(b)
    .bind(product_id)
    .bind(now)
    .execute(pool)
    .await?;

    let sql = format!("{CONVERSATION_SELECT} WHERE participant_a = ?1 AND participant_b = ?2 AND product_id IS ?3");
    sqlx::query_as::<_, Conversation>(&sql)
        .bind(a)
        .bind(b)
        .bind(product_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to open conversation".into()))
}

pub async fn find_summary(
    pool: &SqlitePool,
    viewer_id: i64,
    conversation_id: i64,
) -> RepoResult<Option<ConversationSummary>> {
    let sql = format!("{SUMMARY_SELECT} WHERE c.id = ?2 AND (c.participant_a = ?1 OR c.participant_b = ?1)");
    let row = sqlx::query_as::<_, ConversationSummary>(&sql)
        .bind(viewer_id)
        .bind(conversation_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Most recently active first
pub async fn list_summaries(pool: &SqlitePool, viewer_id: i64) -> RepoResult<Vec<ConversationSummary>> {
    let sql = format!(
        "{SUMMARY_SELECT} WHERE c.participant_a = ?1 OR c.participant_b = ?1 ORDER BY c.updated_at DESC, c.id DESC"
    );
    let rows = sqlx::query_as::<_, ConversationSummary>(&sql)
        .bind(viewer_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Insert the message, point the conversation at it and bump the
/// recipient's unread counter in one transaction
pub async fn send(
    pool: &SqlitePool,
    conversation_id: i64,
    sender_id: i64,
    data: &MessageCreate,
) -> RepoResult<Message> {
    let id = shared::util::snowflake_id();
    let now = shared::util::now_millis();

    let mut tx = pool.begin().await?;
    sqlx::query(
        "INSERT INTO message (id, conversation_id, sender_id, content, message_type, attachments, is_deleted, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?7)",
    )
    .bind(id)
    .bind(conversation_id)
    .bind(sender_id)
    .bind(data.content.trim())
    .bind(data.message_type)
    .bind(Json(&data.attachments))
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let rows = sqlx::query(
        "UPDATE conversation SET last_message_id = ?1, \
            unread_a = unread_a + CASE WHEN participant_a = ?2 THEN 0 ELSE 1 END, \
            unread_b = unread_b + CASE WHEN participant_b = ?2 THEN 0 ELSE 1 END, \
            updated_at = ?3 \
         WHERE id = ?4",
    )
    .bind(id)
    .bind(sender_id)
    .bind(now)
    .bind(conversation_id)
    .execute(&mut *tx)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Conversation {conversation_id} not found")));
    }
    tx.commit().await?;

    find_message(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to send message".into()))
}

pub async fn find_message(pool: &SqlitePool, id: i64) -> RepoResult<Option<Message>> {
    let sql = format!("{MESSAGE_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Message>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// One page counted from the newest message, returned oldest first
pub async fn list_messages(
    pool: &SqlitePool,
    conversation_id: i64,
    limit: i64,
    offset: i64,
) -> RepoResult<(Vec<Message>, i64)> {
    let sql = format!(
        "{MESSAGE_SELECT} WHERE conversation_id = ?1 AND is_deleted = 0 ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3"
    );
    let mut rows = sqlx::query_as::<_, Message>(&sql)
        .bind(conversation_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    rows.reverse();

    let (total,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM message WHERE conversation_id = ? AND is_deleted = 0")
            .bind(conversation_id)
            .fetch_one(pool)
            .await?;
    Ok((rows, total))
}

/// Stamp the other side's messages read and reset the reader's counter.
/// Returns the number of messages newly marked.
pub async fn mark_read(pool: &SqlitePool, conversation_id: i64, reader_id: i64) -> RepoResult<u64> {
    let now = shared::util::now_millis();

    let mut tx = pool.begin().await?;
    let marked = sqlx::query(
        "UPDATE message SET read_at = ?1 \
         WHERE conversation_id = ?2 AND sender_id != ?3 AND read_at IS NULL",
    )
    .bind(now)
    .bind(conversation_id)
    .bind(reader_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    sqlx::query(
        "UPDATE conversation SET \
            unread_a = CASE WHEN participant_a = ?1 THEN 0 ELSE unread_a END, \
            unread_b = CASE WHEN participant_b = ?1 THEN 0 ELSE unread_b END \
         WHERE id = ?2",
    )
    .bind(reader_id)
    .bind(conversation_id)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(marked)
}

/// Soft delete by the sender; `false` when the message is not theirs or already gone
pub async fn soft_delete(pool: &SqlitePool, id: i64, sender_id: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE message SET is_deleted = 1, content = ?1, attachments = '[]', updated_at = ?2 \
         WHERE id = ?3 AND sender_id = ?4 AND is_deleted = 0",
    )
    .bind(DELETED_PLACEHOLDER)
    .bind(shared::util::now_millis())
    .bind(id)
    .bind(sender_id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}
