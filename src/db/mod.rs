//! Query functions over the Postgres schema in `migrations/`.
//!
//! Each submodule owns one table and exposes free async functions taking a
//! `&PgPool`; errors are plain `sqlx::Error` and get mapped by `AppError`.

pub mod api_logs;
pub mod api_tokens;
pub mod odoo_credentials;
pub mod refresh_tokens;
pub mod tenants;
pub mod users;
