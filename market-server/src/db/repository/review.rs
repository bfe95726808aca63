//! Review Repository

use super::RepoResult;
use shared::models::{Review, ReviewQuery, ReviewSort, ReviewStatus};
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

const REVIEW_SELECT: &str = "SELECT id, product_id, user_id, rating, title, comment, verified_purchase, status, helpful, created_at, updated_at FROM review";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Review>> {
    let sql = format!("{REVIEW_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Review>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Row values for a new review
#[derive(Debug, Clone)]
pub struct NewReview {
    pub id: i64,
    pub product_id: i64,
    pub user_id: i64,
    pub rating: i64,
    pub title: Option<String>,
    pub comment: String,
    pub verified_purchase: bool,
}

/// Fails with `Duplicate` when the user already reviewed the product
pub async fn insert(conn: &mut SqliteConnection, review: &NewReview, now: i64) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO review (id, product_id, user_id, rating, title, comment, verified_purchase, status, helpful, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'pending', '[]', ?8, ?8)",
    )
    .bind(review.id)
    .bind(review.product_id)
    .bind(review.user_id)
    .bind(review.rating)
    .bind(&review.title)
    .bind(&review.comment)
    .bind(review.verified_purchase)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn update_content(
    conn: &mut SqliteConnection,
    id: i64,
    rating: Option<i64>,
    title: Option<&str>,
    comment: Option<&str>,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE review SET rating = COALESCE(?1, rating), title = COALESCE(?2, title), comment = COALESCE(?3, comment), updated_at = ?4 WHERE id = ?5",
    )
    .bind(rating)
    .bind(title)
    .bind(comment)
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn set_status(
    conn: &mut SqliteConnection,
    id: i64,
    status: ReviewStatus,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query("UPDATE review SET status = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(status)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn delete(conn: &mut SqliteConnection, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM review WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// `(AVG(rating), COUNT(*))` over approved reviews; average is `None` when
/// there are none
pub async fn approved_stats(
    conn: &mut SqliteConnection,
    product_id: i64,
) -> RepoResult<(Option<f64>, i64)> {
    let row: (Option<f64>, i64) = sqlx::query_as(
        "SELECT AVG(rating), COUNT(*) FROM review WHERE product_id = ? AND status = 'approved'",
    )
    .bind(product_id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(row)
}

/// Approved review count per star, index 0 = one star
pub async fn rating_distribution(pool: &SqlitePool, product_id: i64) -> RepoResult<[i64; 5]> {
    let rows: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT rating, COUNT(*) FROM review WHERE product_id = ? AND status = 'approved' GROUP BY rating",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    let mut dist = [0i64; 5];
    for (rating, count) in rows {
        if (1..=5).contains(&rating) {
            dist[(rating - 1) as usize] = count;
        }
    }
    Ok(dist)
}

fn push_product_filters(qb: &mut QueryBuilder<'_, Sqlite>, product_id: i64, query: &ReviewQuery) {
    qb.push(" WHERE status = 'approved' AND product_id = ")
        .push_bind(product_id);
    if let Some(rating) = query.rating {
        qb.push(" AND rating = ").push_bind(rating);
    }
    if let Some(verified) = query.verified {
        qb.push(" AND verified_purchase = ").push_bind(verified);
    }
}

/// Approved reviews of a product; returns the page and the total count
pub async fn list_for_product(
    pool: &SqlitePool,
    product_id: i64,
    query: &ReviewQuery,
    limit: i64,
    offset: i64,
) -> RepoResult<(Vec<Review>, i64)> {
    let order_by = match query.sort {
        ReviewSort::Newest => "created_at DESC",
        ReviewSort::RatingHigh => "rating DESC, created_at DESC",
        ReviewSort::RatingLow => "rating ASC, created_at DESC",
        ReviewSort::Helpful => "json_array_length(helpful) DESC, created_at DESC",
    };

    let mut qb = QueryBuilder::<Sqlite>::new(REVIEW_SELECT);
    push_product_filters(&mut qb, product_id, query);
    qb.push(" ORDER BY ")
        .push(order_by)
        .push(", id DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let rows = qb.build_query_as::<Review>().fetch_all(pool).await?;

    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM review");
    push_product_filters(&mut count, product_id, query);
    let (total,): (i64,) = count.build_query_as().fetch_one(pool).await?;

    Ok((rows, total))
}

pub async fn list_by_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<Review>> {
    let sql = format!("{REVIEW_SELECT} WHERE user_id = ? ORDER BY created_at DESC");
    let rows = sqlx::query_as::<_, Review>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn list_pending(pool: &SqlitePool) -> RepoResult<Vec<Review>> {
    let sql = format!("{REVIEW_SELECT} WHERE status = 'pending' ORDER BY created_at");
    let rows = sqlx::query_as::<_, Review>(&sql).fetch_all(pool).await?;
    Ok(rows)
}

/// Replace the helpful set if it still equals `expected`
pub async fn replace_helpful(
    pool: &SqlitePool,
    id: i64,
    expected: &[i64],
    helpful: &[i64],
) -> RepoResult<bool> {
    let rows = sqlx::query("UPDATE review SET helpful = ?1 WHERE id = ?2 AND helpful = ?3")
        .bind(Json(helpful))
        .bind(id)
        .bind(Json(expected))
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
