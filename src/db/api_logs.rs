use sqlx::PgPool;

use crate::models::ApiLogEntry;

pub async fn insert(pool: &PgPool, entry: &ApiLogEntry) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO api_logs (endpoint, method, request_ip, user_id, api_token_id, \
         response_status_code, message, duration_ms) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(&entry.endpoint)
    .bind(&entry.method)
    .bind(&entry.request_ip)
    .bind(entry.user_id)
    .bind(entry.api_token_id)
    .bind(entry.response_status_code)
    .bind(&entry.message)
    .bind(entry.duration_ms)
    .execute(pool)
    .await?;
    Ok(())
}
