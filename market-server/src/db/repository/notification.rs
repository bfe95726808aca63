//! Notification Repository

use super::{RepoError, RepoResult};
use shared::models::{Notification, NotificationCreate};
use sqlx::SqlitePool;

const NOTIFICATION_SELECT: &str = "SELECT id, recipient_id, kind, title, message, link, related_order_id, related_product_id, is_read, read_at, created_at FROM notification";

pub async fn create(pool: &SqlitePool, data: &NotificationCreate) -> RepoResult<Notification> {
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO notification (id, recipient_id, kind, title, message, link, related_order_id, related_product_id, is_read, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9)",
    )
    .bind(id)
    .bind(data.recipient_id)
    .bind(data.kind)
    .bind(&data.title)
    .bind(&data.message)
    .bind(&data.link)
    .bind(data.related_order_id)
    .bind(data.related_product_id)
    .bind(shared::util::now_millis())
    .execute(pool)
    .await?;

    let sql = format!("{NOTIFICATION_SELECT} WHERE id = ?");
    sqlx::query_as::<_, Notification>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create notification".into()))
}

/// Newest first; returns the page and the total count
pub async fn list(
    pool: &SqlitePool,
    recipient_id: i64,
    unread_only: bool,
    limit: i64,
    offset: i64,
) -> RepoResult<(Vec<Notification>, i64)> {
    let filter = if unread_only {
        "WHERE recipient_id = ?1 AND is_read = 0"
    } else {
        "WHERE recipient_id = ?1"
    };
    let sql = format!("{NOTIFICATION_SELECT} {filter} ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3");
    let rows = sqlx::query_as::<_, Notification>(&sql)
        .bind(recipient_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let count_sql = format!("SELECT COUNT(*) FROM notification {filter}");
    let (total,): (i64,) = sqlx::query_as(&count_sql)
        .bind(recipient_id)
        .fetch_one(pool)
        .await?;
    Ok((rows, total))
}

pub async fn unread_count(pool: &SqlitePool, recipient_id: i64) -> RepoResult<i64> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM notification WHERE recipient_id = ? AND is_read = 0")
            .bind(recipient_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

/// Idempotent; returns `false` when the notification does not belong to the recipient
pub async fn mark_read(pool: &SqlitePool, recipient_id: i64, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE notification SET is_read = 1, read_at = COALESCE(read_at, ?1) WHERE id = ?2 AND recipient_id = ?3",
    )
    .bind(shared::util::now_millis())
    .bind(id)
    .bind(recipient_id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn mark_all_read(pool: &SqlitePool, recipient_id: i64) -> RepoResult<u64> {
    let rows = sqlx::query(
        "UPDATE notification SET is_read = 1, read_at = ?1 WHERE recipient_id = ?2 AND is_read = 0",
    )
    .bind(shared::util::now_millis())
    .bind(recipient_id)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected())
}

pub async fn delete(pool: &SqlitePool, recipient_id: i64, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM notification WHERE id = ? AND recipient_id = ?")
        .bind(id)
        .bind(recipient_id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
