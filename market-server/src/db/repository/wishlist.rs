//! Wishlist Repository

use super::RepoResult;
use shared::models::Product;
use sqlx::SqlitePool;

pub async fn find_by_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<Product>> {
    let rows = sqlx::query_as::<_, Product>(
        "SELECT p.id, p.seller_id, p.category_id, p.title, p.description, p.price, p.compare_price, p.stock, p.sales, p.status, p.images, p.tags, p.sku, p.rating, p.review_count, p.created_at, p.updated_at \
         FROM wishlist_item w JOIN product p ON p.id = w.product_id \
         WHERE w.user_id = ? ORDER BY w.added_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Idempotent add
pub async fn add(pool: &SqlitePool, user_id: i64, product_id: i64) -> RepoResult<()> {
    sqlx::query(
        "INSERT OR IGNORE INTO wishlist_item (user_id, product_id, added_at) VALUES (?, ?, ?)",
    )
    .bind(user_id)
    .bind(product_id)
    .bind(shared::util::now_millis())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn remove(pool: &SqlitePool, user_id: i64, product_id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM wishlist_item WHERE user_id = ? AND product_id = ?")
        .bind(user_id)
        .bind(product_id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
