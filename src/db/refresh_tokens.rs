//! Server-side record of issued refresh tokens, keyed by the JWT `jti`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

/// What happened when a refresh token was presented.
#[derive(Debug, PartialEq, Eq)]
pub enum Consumption {
    /// First use: the token is now spent.
    Consumed { user_id: i32 },
    /// The token was already spent or revoked.
    Reused { user_id: i32 },
    /// Unknown or expired.
    Invalid,
}

pub async fn create(
    pool: &PgPool,
    jti: &str,
    user_id: i32,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO refresh_tokens (id, user_id, expires_at) VALUES ($1, $2, $3)")
        .bind(jti)
        .bind(user_id)
        .bind(expires_at)
        .execute(pool)
        .await?;
    Ok(())
}

/// Marks the token spent in one statement, so two concurrent refreshes
/// with the same token cannot both succeed.
pub async fn consume(pool: &PgPool, jti: &str) -> Result<Consumption, sqlx::Error> {
    let consumed: Option<i32> = sqlx::query_scalar(
        "UPDATE refresh_tokens SET revoked = TRUE \
         WHERE id = $1 AND NOT revoked AND expires_at > NOW() RETURNING user_id",
    )
    .bind(jti)
    .fetch_optional(pool)
    .await?;
    if let Some(user_id) = consumed {
        return Ok(Consumption::Consumed { user_id });
    }

    let row: Option<(i32, bool)> =
        sqlx::query_as("SELECT user_id, revoked FROM refresh_tokens WHERE id = $1")
            .bind(jti)
            .fetch_optional(pool)
            .await?;
    Ok(match row {
        Some((user_id, true)) => Consumption::Reused { user_id },
        _ => Consumption::Invalid,
    })
}

pub async fn revoke_all(pool: &PgPool, user_id: i32) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = $1 AND NOT revoked")
            .bind(user_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}
