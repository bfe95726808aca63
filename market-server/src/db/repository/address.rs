//! Address Repository
//!
//! At most one default address per user.

use super::{RepoError, RepoResult};
use shared::models::{Address, AddressInput};
use sqlx::{SqliteConnection, SqlitePool};

const ADDRESS_SELECT: &str = "SELECT id, user_id, full_name, phone, address_line1, address_line2, city, state, postal_code, country, is_default FROM address";

pub async fn find_by_user(pool: &SqlitePool, user_id: i64) -> RepoResult<Vec<Address>> {
    let sql = format!("{ADDRESS_SELECT} WHERE user_id = ? ORDER BY is_default DESC, id");
    let rows = sqlx::query_as::<_, Address>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn find_by_id(pool: &SqlitePool, user_id: i64, id: i64) -> RepoResult<Option<Address>> {
    let sql = format!("{ADDRESS_SELECT} WHERE id = ? AND user_id = ?");
    let row = sqlx::query_as::<_, Address>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

async fn clear_default(conn: &mut SqliteConnection, user_id: i64) -> RepoResult<()> {
    sqlx::query("UPDATE address SET is_default = 0 WHERE user_id = ? AND is_default = 1")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Insert an address; the first address of a user is always the default
pub async fn create(pool: &SqlitePool, user_id: i64, input: AddressInput) -> RepoResult<Address> {
    let id = shared::util::snowflake_id();
    let a = &input.address;

    let mut tx = pool.begin().await?;
    if input.is_default {
        clear_default(&mut tx, user_id).await?;
    }
    sqlx::query(
        "INSERT INTO address (id, user_id, full_name, phone, address_line1, address_line2, city, state, postal_code, country, is_default) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, \
            CASE WHEN ?11 = 1 OR NOT EXISTS (SELECT 1 FROM address WHERE user_id = ?2) THEN 1 ELSE 0 END)",
    )
    .bind(id)
    .bind(user_id)
    .bind(&a.full_name)
    .bind(&a.phone)
    .bind(&a.address_line1)
    .bind(&a.address_line2)
    .bind(&a.city)
    .bind(&a.state)
    .bind(&a.postal_code)
    .bind(&a.country)
    .bind(input.is_default)
    .execute(&mut *tx)
    .await?;
    tx.commit().await?;

    find_by_id(pool, user_id, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create address".into()))
}

/// Replace an address in full
pub async fn update(
    pool: &SqlitePool,
    user_id: i64,
    id: i64,
    input: AddressInput,
) -> RepoResult<Address> {
    let a = &input.address;

    let mut tx = pool.begin().await?;
    if input.is_default {
        clear_default(&mut tx, user_id).await?;
    }
    let rows = sqlx::query(
        "UPDATE address SET full_name = ?1, phone = ?2, address_line1 = ?3, address_line2 = ?4, city = ?5, state = ?6, postal_code = ?7, country = ?8, \
            is_default = CASE WHEN ?9 = 1 THEN 1 ELSE is_default END \
         WHERE id = ?10 AND user_id = ?11",
    )
    .bind(&a.full_name)
    .bind(&a.phone)
    .bind(&a.address_line1)
    .bind(&a.address_line2)
    .bind(&a.city)
    .bind(&a.state)
    .bind(&a.postal_code)
    .bind(&a.country)
    .bind(input.is_default)
    .bind(id)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Address {id} not found")));
    }
    tx.commit().await?;

    find_by_id(pool, user_id, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("Address {id} not found")))
}

pub async fn delete(pool: &SqlitePool, user_id: i64, id: i64) -> RepoResult<bool> {
    let rows = sqlx::query("DELETE FROM address WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
