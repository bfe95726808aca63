//! User Repository

use super::{RepoError, RepoResult};
use shared::models::{
    AccountStatus, SellerApplication, SellerApplicationCreate, User, UserRole, UserUpdate,
};
use sqlx::SqlitePool;

const USER_SELECT: &str = "SELECT id, first_name, last_name, email, password_hash, phone, role, account_status, shop_name, shop_description, last_login, created_at, updated_at FROM users";

/// Row values for a new account; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub role: UserRole,
    pub shop_name: Option<String>,
}

pub async fn find_by_id(pool: &SqlitePool, id: i64) -> RepoResult<Option<User>> {
    let sql = format!("{USER_SELECT} WHERE id = ?");
    let row = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

/// Lookup by email (case-insensitive; emails are stored lowercased)
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> RepoResult<Option<User>> {
    let sql = format!("{USER_SELECT} WHERE email = ?");
    let row = sqlx::query_as::<_, User>(&sql)
        .bind(email.trim().to_lowercase())
        .fetch_optional(pool)
        .await?;
    Ok(row)
}

pub async fn create(pool: &SqlitePool, data: NewUser) -> RepoResult<User> {
    let now = shared::util::now_millis();
    let id = shared::util::snowflake_id();
    sqlx::query(
        "INSERT INTO users (id, first_name, last_name, email, password_hash, phone, role, account_status, shop_name, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 'active', ?8, ?9, ?9)",
    )
    .bind(id)
    .bind(&data.first_name)
    .bind(&data.last_name)
    .bind(data.email.trim().to_lowercase())
    .bind(&data.password_hash)
    .bind(&data.phone)
    .bind(data.role)
    .bind(&data.shop_name)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to create user".into()))
}

pub async fn update_profile(pool: &SqlitePool, id: i64, data: UserUpdate) -> RepoResult<User> {
    let now = shared::util::now_millis();
    let rows = sqlx::query(
        "UPDATE users SET first_name = COALESCE(?1, first_name), last_name = COALESCE(?2, last_name), phone = COALESCE(?3, phone), shop_name = COALESCE(?4, shop_name), shop_description = COALESCE(?5, shop_description), updated_at = ?6 WHERE id = ?7",
    )
    .bind(&data.first_name)
    .bind(&data.last_name)
    .bind(&data.phone)
    .bind(&data.shop_name)
    .bind(&data.shop_description)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("User {id} not found")));
    }
    find_by_id(pool, id)
        .await?
        .ok_or_else(|| RepoError::NotFound(format!("User {id} not found")))
}

pub async fn update_password(pool: &SqlitePool, id: i64, password_hash: &str) -> RepoResult<()> {
    let now = shared::util::now_millis();
    sqlx::query("UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(password_hash)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_status(pool: &SqlitePool, id: i64, status: AccountStatus) -> RepoResult<bool> {
    let now = shared::util::now_millis();
    let rows = sqlx::query("UPDATE users SET account_status = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(status)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}

pub async fn touch_last_login(pool: &SqlitePool, id: i64) -> RepoResult<()> {
    sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
        .bind(shared::util::now_millis())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// All admin accounts (notification fan-out)
pub async fn find_admin_ids(pool: &SqlitePool) -> RepoResult<Vec<i64>> {
    let rows: Vec<(i64,)> =
        sqlx::query_as("SELECT id FROM users WHERE role = 'admin' AND account_status = 'active'")
            .fetch_all(pool)
            .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

pub async fn find_seller_application(
    pool: &SqlitePool,
    user_id: i64,
) -> RepoResult<Option<SellerApplication>> {
    let row = sqlx::query_as::<_, SellerApplication>(
        "SELECT user_id, fee_amount, payment_method, transaction_id, status, paid_at FROM seller_application WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Record the paid fee and upgrade the buyer to seller in one transaction.
///
/// A second application hits the primary key and returns `Duplicate`; an
/// account that is no longer a buyer returns `Validation`.
pub async fn approve_seller_application(
    pool: &SqlitePool,
    user_id: i64,
    fee_amount: f64,
    data: &SellerApplicationCreate,
) -> RepoResult<SellerApplication> {
    let now = shared::util::now_millis();

    let mut tx = pool.begin().await?;
    sqlx::query(
        "INSERT INTO seller_application (user_id, fee_amount, payment_method, transaction_id, status, paid_at) \
         VALUES (?1, ?2, ?3, ?4, 'approved', ?5)",
    )
    .bind(user_id)
    .bind(fee_amount)
    .bind(data.payment_method.trim())
    .bind(data.transaction_id.trim())
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let rows = sqlx::query(
        "UPDATE users SET role = ?1, updated_at = ?2 WHERE id = ?3 AND role = ?4",
    )
    .bind(UserRole::Seller)
    .bind(now)
    .bind(user_id)
    .bind(UserRole::Buyer)
    .execute(&mut *tx)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::Validation(
            "Only buyer accounts can apply to become a seller".into(),
        ));
    }
    tx.commit().await?;

    find_seller_application(pool, user_id)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to record seller application".into()))
}
