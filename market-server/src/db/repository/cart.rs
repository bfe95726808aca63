//! Cart Repository
//!
//! Cart lines are keyed by (user_id, product_id); adding an existing product
//! accumulates the quantity.

use super::RepoResult;
use shared::models::CartItem;
use sqlx::{SqliteConnection, SqlitePool};

pub async fn find_by_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<CartItem>> {
    let rows = sqlx::query_as::<_, CartItem>(
        "SELECT c.product_id, c.quantity, c.added_at, p.title, p.price, p.stock, p.status \
         FROM cart_item c JOIN product p ON p.id = c.product_id \
         WHERE c.user_id = ? ORDER BY c.added_at, c.product_id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn quantity_of(pool: &SqlitePool, user_id: i64, product_id: i64) -> RepoResult<i64> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT quantity FROM cart_item WHERE user_id = ? AND product_id = ?")
            .bind(user_id)
            .bind(product_id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|(q,)| q).unwrap_or(0))
}

pub async fn add(pool: &SqlitePool, user_id: i64, product_id: i64, quantity: i64) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO cart_item (user_id, product_id, quantity, added_at) VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT (user_id, product_id) DO UPDATE SET quantity = quantity + excluded.quantity",
    )
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .bind(shared::util::now_millis())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_quantity(
    pool: &SqlitePool,
    user_id: i64,
    product_id: i64,
    quantity: i64,
) -> RepoResult<bool> {
    let rows =
        sqlx::query("UPDATE cart_item SET quantity = ?1 WHERE user_id = ?2 AND product_id = ?3")
            .bind(quantity)
            .bind(user_id)
            .bind(product_id)
            .execute(pool)
            .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn remove(pool: &SqlitePool, user_id: i64, product_id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM cart_item WHERE user_id = ? AND product_id = ?")
        .bind(user_id)
        .bind(product_id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Empty the cart; runs inside the order-creation transaction
pub async fn clear(conn: &mut SqliteConnection, user_id: i64) -> RepoResult<u64> {
    let rows = sqlx::query("DELETE FROM cart_item WHERE user_id = ?")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(rows.rows_affected())
}
