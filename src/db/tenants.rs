use sqlx::PgPool;

use crate::models::Tenant;

pub async fn list(pool: &PgPool, skip: i64, limit: i64) -> Result<Vec<Tenant>, sqlx::Error> {
    sqlx::query_as::<_, Tenant>(
        "SELECT id, name, is_active, created_at, updated_at FROM tenants ORDER BY name OFFSET $1 LIMIT $2",
    )
    .bind(skip)
    .bind(limit)
    .fetch_all(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: i32) -> Result<Option<Tenant>, sqlx::Error> {
    sqlx::query_as::<_, Tenant>(
        "SELECT id, name, is_active, created_at, updated_at FROM tenants WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn name_taken(pool: &PgPool, name: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tenants WHERE LOWER(name) = LOWER($1))")
        .bind(name)
        .fetch_one(pool)
        .await
}

pub async fn exists(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tenants WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
}

pub async fn create(pool: &PgPool, name: &str, is_active: bool) -> Result<Tenant, sqlx::Error> {
    sqlx::query_as::<_, Tenant>(
        "INSERT INTO tenants (name, is_active) VALUES ($1, $2) \
         RETURNING id, name, is_active, created_at, updated_at",
    )
    .bind(name)
    .bind(is_active)
    .fetch_one(pool)
    .await
}

pub async fn set_active(pool: &PgPool, id: i32, is_active: bool) -> Result<Option<Tenant>, sqlx::Error> {
    sqlx::query_as::<_, Tenant>(
        "UPDATE tenants SET is_active = $2, updated_at = NOW() WHERE id = $1 \
         RETURNING id, name, is_active, created_at, updated_at",
    )
    .bind(id)
    .bind(is_active)
    .fetch_optional(pool)
    .await
}

pub async fn count_users(pool: &PgPool, id: i32) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE tenant_id = $1")
        .bind(id)
        .fetch_one(pool)
        .await
}

/// Credentials go with the tenant (`ON DELETE CASCADE`); users block the delete.
pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tenants WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
