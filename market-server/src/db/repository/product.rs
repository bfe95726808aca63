//! Product Repository
//!
//! Stock counters are only changed through the conditional statements in
//! this module: `reserve_stock` never lets `stock` go negative and
//! `restore_stock` is its inverse.

use super::{RepoError, RepoResult};
use shared::models::{Product, ProductCreate, ProductQuery, ProductStatus, RatingSummary};
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

const PRODUCT_SELECT: &str = "SELECT id, seller_id, category_id, title, description, price, compare_price, stock, sales, status, images, tags, sku, rating, review_count, created_at, updated_at FROM product";

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<Product>> {
    let sql = format!("{PRODUCT_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

fn push_filters<'a>(qb: &mut QueryBuilder<'a, Sqlite>, query: &'a ProductQuery) {
    qb.push(" WHERE 1 = 1");
    match query.status {
        Some(status) => {
            qb.push(" AND status = ").push_bind(status);
        }
        // 公共列表默认只显示在售商品
        None if query.seller_id.is_none() => {
            qb.push(" AND status = ").push_bind(ProductStatus::Active);
        }
        None => {}
    }
    if let Some(category_id) = query.category_id {
        qb.push(" AND category_id = ").push_bind(category_id);
    }
    if let Some(seller_id) = query.seller_id {
        qb.push(" AND seller_id = ").push_bind(seller_id);
    }
    if let Some(min) = query.min_price {
        qb.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = query.max_price {
        qb.push(" AND price <= ").push_bind(max);
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        qb.push(" AND title LIKE ")
            .push_bind(format!("%{}%", search.trim()));
    }
}

/// Filtered listing, newest first. Returns the page and the total match count.
pub async fn list(
    pool: &SqlitePool,
    query: &ProductQuery,
    limit: i64,
    offset: i64,
) -> RepoResult<(Vec<Product>, i64)> {
    let mut qb = QueryBuilder::<Sqlite>::new(PRODUCT_SELECT);
    push_filters(&mut qb, query);
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);
    let rows = qb.build_query_as::<Product>().fetch_all(pool).await?;

    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM product");
    push_filters(&mut count, query);
    let (total,): (i64,) = count.build_query_as().fetch_one(pool).await?;

    Ok((rows, total))
}

pub async fn create(pool: &SqlitePool, seller_id: i64, data: ProductCreate) -> RepoResult<Product> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    let status = if data.stock > 0 {
        ProductStatus::Active
    } else {
        ProductStatus::OutOfStock
    };
    sqlx::query(
        "INSERT INTO product (id, seller_id, category_id, title, description, price, compare_price, stock, sales, status, images, tags, sku, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9, ?10, ?11, ?12, ?13, ?13)",
    )
    .bind(id)
    .bind(seller_id)
    .bind(data.category_id)
    .bind(&data.title)
    .bind(&data.description)
    .bind(data.price)
    .bind(data.compare_price)
    .bind(data.stock)
    .bind(status)
    .bind(Json(&data.images))
    .bind(Json(&data.tags))
    .bind(&data.sku)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create product".into()))
}

/// Partial update. Stock edits move `active` <-> `out-of-stock` unless a
/// status is given explicitly.
pub async fn update(
    pool: &SqlitePool,
    id: i64,
    data: shared::models::ProductUpdate,
) -> RepoResult<Product> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE product SET \
            title = COALESCE(?1, title), \
            description = COALESCE(?2, description), \
            price = COALESCE(?3, price), \
            compare_price = COALESCE(?4, compare_price), \
            category_id = COALESCE(?5, category_id), \
            images = COALESCE(?6, images), \
            tags = COALESCE(?7, tags), \
            sku = COALESCE(?8, sku), \
            status = CASE \
                WHEN ?9 IS NOT NULL THEN ?9 \
                WHEN COALESCE(?10, stock) = 0 AND status = 'active' THEN 'out-of-stock' \
                WHEN COALESCE(?10, stock) > 0 AND status = 'out-of-stock' THEN 'active' \
                ELSE status END, \
            stock = COALESCE(?10, stock), \
            updated_at = ?11 \
         WHERE id = ?12",
    )
    .bind(&data.title)
    .bind(&data.description)
    .bind(data.price)
    .bind(data.compare_price)
    .bind(data.category_id)
    .bind(data.images.as_ref().map(Json))
    .bind(data.tags.as_ref().map(Json))
    .bind(&data.sku)
    .bind(data.status)
    .bind(data.stock)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Product {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Product {id} not found")))
}

pub async fn delete(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM product WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

/// Whether any order line points at the product
pub async fn is_referenced_by_orders(pool: &SqlitePool, id: i64) -> RepoResult<bool> {
    let (exists,): (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM order_item WHERE product_id = ?)")
            .bind(id)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

/// Conditionally take `quantity` units from an active product.
///
/// Returns `false` when the product is no longer active or has too little
/// stock; nothing is written in that case. Reaching zero flips the status to
/// `out-of-stock` in the same statement.
pub async fn reserve_stock(
    conn: &mut SqliteConnection,
    product_id: i64,
    quantity: i64,
    now: i64,
) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE product SET \
            stock = stock - ?1, \
            sales = sales + ?1, \
            status = CASE WHEN stock - ?1 = 0 THEN 'out-of-stock' ELSE status END, \
            updated_at = ?2 \
         WHERE id = ?3 AND status = 'active' AND stock >= ?1",
    )
    .bind(quantity)
    .bind(now)
    .bind(product_id)
    .execute(&mut *conn)
    .await?;
    Ok(rows.rows_affected() == 1)
}

/// Give back units of a cancelled order; `out-of-stock` products become
/// `active` again, `inactive` ones stay inactive.
pub async fn restore_stock(
    conn: &mut SqliteConnection,
    product_id: i64,
    quantity: i64,
    now: i64,
) -> RepoResult<()> {
    sqlx::query(
        "UPDATE product SET \
            stock = stock + ?1, \
            sales = MAX(sales - ?1, 0), \
            status = CASE WHEN status = 'out-of-stock' THEN 'active' ELSE status END, \
            updated_at = ?2 \
         WHERE id = ?3",
    )
    .bind(quantity)
    .bind(now)
    .bind(product_id)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Write the denormalized rating aggregate
pub async fn set_rating(
    conn: &mut SqliteConnection,
    product_id: i64,
    summary: RatingSummary,
) -> RepoResult<()> {
    sqlx::query("UPDATE product SET rating = ?1, review_count = ?2 WHERE id = ?3")
        .bind(summary.rating)
        .bind(summary.review_count)
        .bind(product_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}
