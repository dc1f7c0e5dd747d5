use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::User;

const USER_COLUMNS: &str = "id, email, hashed_password, full_name, job_title, phone, is_active, \
     is_admin, tenant_id, odoo_employee_id, created_at, updated_at";

/// Fields of a user row about to be inserted.
pub struct NewUser<'a> {
    pub email: &'a str,
    pub hashed_password: &'a str,
    pub full_name: Option<&'a str>,
    pub tenant_id: i32,
    pub is_admin: bool,
    pub is_active: bool,
    pub odoo_employee_id: Option<i32>,
    pub job_title: Option<&'a str>,
    pub phone: Option<&'a str>,
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Emails are compared case-insensitively.
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
    ))
    .bind(email)
    .fetch_optional(pool)
    .await
}

pub async fn list(pool: &PgPool, skip: i64, limit: i64) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY id OFFSET $1 LIMIT $2"
    ))
    .bind(skip)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn create(pool: &PgPool, user: &NewUser<'_>) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (email, hashed_password, full_name, tenant_id, is_admin, is_active, \
         odoo_employee_id, job_title, phone) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(user.email)
    .bind(user.hashed_password)
    .bind(user.full_name)
    .bind(user.tenant_id)
    .bind(user.is_admin)
    .bind(user.is_active)
    .bind(user.odoo_employee_id)
    .bind(user.job_title)
    .bind(user.phone)
    .fetch_one(pool)
    .await
}

/// Persists every editable column of `user`, including its password hash.
pub async fn save(pool: &PgPool, user: &User) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET email = $2, hashed_password = $3, full_name = $4, job_title = $5, \
         phone = $6, is_active = $7, is_admin = $8, tenant_id = $9, odoo_employee_id = $10, \
         updated_at = NOW() \
         WHERE id = $1 RETURNING {USER_COLUMNS}"
    ))
    .bind(user.id)
    .bind(&user.email)
    .bind(&user.hashed_password)
    .bind(&user.full_name)
    .bind(&user.job_title)
    .bind(&user.phone)
    .bind(user.is_active)
    .bind(user.is_admin)
    .bind(user.tenant_id)
    .bind(user.odoo_employee_id)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Whether another account already uses `email`.
pub async fn email_taken(pool: &PgPool, email: &str, except_id: Option<i32>) -> Result<bool, sqlx::Error> {
    let taken: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND ($2::INT IS NULL OR id <> $2))",
    )
    .bind(email)
    .bind(except_id)
    .fetch_one(pool)
    .await?;
    Ok(taken)
}

pub async fn set_reset_token(
    pool: &PgPool,
    id: i32,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE users SET password_reset_token_hash = $2, password_reset_expires_at = $3 WHERE id = $1",
    )
    .bind(id)
    .bind(token_hash)
    .bind(expires_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Swaps in a new password hash for the active user holding an unexpired
/// reset token with this hash, consuming the token in the same statement.
/// `None` when no such user exists, including when another request won the token first.
pub async fn reset_password_with_token(
    pool: &PgPool,
    token_hash: &str,
    hashed_password: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users SET hashed_password = $2, password_reset_token_hash = NULL, \
         password_reset_expires_at = NULL, updated_at = NOW() \
         WHERE password_reset_token_hash = $1 AND password_reset_expires_at > NOW() AND is_active \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(token_hash)
    .bind(hashed_password)
    .fetch_optional(pool)
    .await
}
