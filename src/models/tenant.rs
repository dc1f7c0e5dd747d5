use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A customer organization. Each tenant talks to its own Odoo instance.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tenant {
    pub id: i32,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TenantCreate {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct TenantStatusUpdate {
    pub is_active: bool,
}

/// `skip`/`limit` query parameters shared by the admin list endpoints.
#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

impl Pagination {
    /// Clamps to sane bounds so a client can't request the whole table at once.
    pub fn bounds(&self) -> (i64, i64) {
        (self.skip.max(0), self.limit.clamp(1, 500))
    }
}
