//! Coupon Repository
//!
//! Usage counters are bumped only with conditional updates, so concurrent
//! orders cannot push a coupon past its global or per-user limit.

use super::{RepoError, RepoResult};
use shared::models::{Coupon, CouponCreate, CouponUpdate, CouponUsage};
use sqlx::types::Json;
use sqlx::{SqliteConnection, SqlitePool};

const COUPON_SELECT: &str = "SELECT id, code, description, discount_type, discount_value, min_purchase_amount, max_discount_amount, start_date, expiry_date, usage_limit, used_count, user_usage_limit, applicable_categories, applicable_products, excluded_products, is_active, created_by, created_at, updated_at FROM coupon";

/// Codes are case-insensitive and stored uppercased
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Coupon>> {
    let sql = format!("{COUPON_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Coupon>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn find_by_code(pool: &SqlitePool, code: &str) -> RepoResult<Option<Coupon>> {
    let sql = format!("{COUPON_SELECT} WHERE code = ?");
    let row = sqlx::query_as::<_, Coupon>(&sql)
        .bind(normalize_code(code))
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// All coupons, or only those created by `created_by`
pub async fn list(pool: &SqlitePool, created_by: Option<i64>) -> RepoResult<Vec<Coupon>> {
    let rows = match created_by {
        Some(owner) => {
            let sql = format!("{COUPON_SELECT} WHERE created_by = ? ORDER BY created_at DESC");
            sqlx::query_as::<_, Coupon>(&sql)
                .bind(owner)
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!("{COUPON_SELECT} ORDER BY created_at DESC");
            sqlx::query_as::<_, Coupon>(&sql).fetch_all(pool).await?
        }
    };
    Ok(rows)
}

pub async fn create(pool: &SqlitePool, created_by: i64, data: CouponCreate) -> RepoResult<Coupon> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO coupon (id, code, description, discount_type, discount_value, min_purchase_amount, max_discount_amount, start_date, expiry_date, usage_limit, used_count, user_usage_limit, applicable_categories, applicable_products, excluded_products, is_active, created_by, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0, ?11, ?12, ?13, ?14, 1, ?15, ?16, ?16)",
    )
    .bind(id)
    .bind(normalize_code(&data.code))
    .bind(&data.description)
    .bind(data.discount_type)
    .bind(data.discount_value)
    .bind(data.min_purchase_amount.unwrap_or(0.0))
    .bind(data.max_discount_amount)
    .bind(data.start_date.unwrap_or(now))
    .bind(data.expiry_date)
    .bind(data.usage_limit)
    .bind(data.user_usage_limit.unwrap_or(1))
    .bind(Json(&data.applicable_categories))
    .bind(Json(&data.applicable_products))
    .bind(Json(&data.excluded_products))
    .bind(created_by)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create coupon".into()))
}

pub async fn update(pool: &SqlitePool, id: i64, data: CouponUpdate) -> RepoResult<Coupon> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE coupon SET \
            description = COALESCE(?1, description), \
            discount_value = COALESCE(?2, discount_value), \
            min_purchase_amount = COALESCE(?3, min_purchase_amount), \
            max_discount_amount = COALESCE(?4, max_discount_amount), \
            start_date = COALESCE(?5, start_date), \
            expiry_date = COALESCE(?6, expiry_date), \
            usage_limit = COALESCE(?7, usage_limit), \
            user_usage_limit = COALESCE(?8, user_usage_limit), \
            applicable_categories = COALESCE(?9, applicable_categories), \
            applicable_products = COALESCE(?10, applicable_products), \
            excluded_products = COALESCE(?11, excluded_products), \
            is_active = COALESCE(?12, is_active), \
            updated_at = ?13 \
         WHERE id = ?14",
    )
    .bind(&data.description)
    .bind(data.discount_value)
    .bind(data.min_purchase_amount)
    .bind(data.max_discount_amount)
    .bind(data.start_date)
    .bind(data.expiry_date)
    .bind(data.usage_limit)
    .bind(data.user_usage_limit)
    .bind(data.applicable_categories.as_ref().map(Json))
    .bind(data.applicable_products.as_ref().map(Json))
    .bind(data.excluded_products.as_ref().map(Json))
    .bind(data.is_active)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Coupon {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Coupon {id} not found")))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM coupon WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn find_usage(
    pool: &SqlitePool,
    coupon_id: i64,
    user_id: i64,
) -> RepoResult<Option<CouponUsage>> {
    let row = sqlx::query_as::<_, CouponUsage>(
        "SELECT coupon_id, user_id, usage_count, last_used FROM coupon_usage WHERE coupon_id = ? AND user_id = ?",
    )
    .bind(coupon_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// `used_count + 1` unless the global limit is reached
pub async fn increment_used(conn: &mut SqliteConnection, coupon_id: i64, now: i64) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE coupon SET used_count = used_count + 1, updated_at = ?1 \
         WHERE id = ?2 AND (usage_limit IS NULL OR used_count < usage_limit)",
    )
    .bind(now)
    .bind(coupon_id)
    .execute(&mut *conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// Per-user `usage_count + 1` unless `user_limit` is reached
pub async fn increment_user_usage(
    conn: &mut SqliteConnection,
    coupon_id: i64,
    user_id: i64,
    user_limit: i64,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "INSERT INTO coupon_usage (coupon_id, user_id, usage_count, last_used) \
         SELECT ?1, ?2, 1, ?4 WHERE ?3 >= 1 \
         ON CONFLICT (coupon_id, user_id) DO UPDATE SET \
            usage_count = coupon_usage.usage_count + 1, last_used = excluded.last_used \
         WHERE coupon_usage.usage_count < ?3",
    )
    .bind(coupon_id)
    .bind(user_id)
    .bind(user_limit)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}
