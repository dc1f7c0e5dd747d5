use sqlx::PgPool;

use crate::models::ApiToken;

const TOKEN_COLUMNS: &str = "id, name, user_id, token, scope, active, last_used, note, created_at";

pub async fn list(pool: &PgPool) -> Result<Vec<ApiToken>, sqlx::Error> {
    sqlx::query_as::<_, ApiToken>(&format!(
        "SELECT {TOKEN_COLUMNS} FROM api_tokens ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    name: &str,
    user_id: i32,
    token: &str,
    scope: Option<&str>,
    note: Option<&str>,
) -> Result<ApiToken, sqlx::Error> {
    sqlx::query_as::<_, ApiToken>(&format!(
        "INSERT INTO api_tokens (name, user_id, token, scope, note) VALUES ($1, $2, $3, $4, $5) \
         RETURNING {TOKEN_COLUMNS}"
    ))
    .bind(name)
    .bind(user_id)
    .bind(token)
    .bind(scope)
    .bind(note)
    .fetch_one(pool)
    .await
}

pub async fn toggle_active(pool: &PgPool, id: i32) -> Result<Option<ApiToken>, sqlx::Error> {
    sqlx::query_as::<_, ApiToken>(&format!(
        "UPDATE api_tokens SET active = NOT active WHERE id = $1 RETURNING {TOKEN_COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Replaces the secret; the previous value stops working immediately.
pub async fn regenerate(pool: &PgPool, id: i32, token: &str) -> Result<Option<ApiToken>, sqlx::Error> {
    sqlx::query_as::<_, ApiToken>(&format!(
        "UPDATE api_tokens SET token = $2 WHERE id = $1 RETURNING {TOKEN_COLUMNS}"
    ))
    .bind(id)
    .bind(token)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, id: i32) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM api_tokens WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// An active token whose owner is an active user.
pub async fn find_valid(pool: &PgPool, token: &str) -> Result<Option<ApiToken>, sqlx::Error> {
    sqlx::query_as::<_, ApiToken>(
        "SELECT t.id, t.name, t.user_id, t.token, t.scope, t.active, t.last_used, t.note, t.created_at \
         FROM api_tokens t JOIN users u ON u.id = t.user_id \
         WHERE t.token = $1 AND t.active AND u.is_active",
    )
    .bind(token)
    .fetch_optional(pool)
    .await
}

pub async fn touch_last_used(pool: &PgPool, id: i32) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE api_tokens SET last_used = NOW() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
