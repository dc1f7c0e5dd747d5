use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::crypto::redact;

/// A long-lived key that lets another system call the integration API on
/// behalf of `user_id`.
#[derive(Debug, Clone, FromRow)]
pub struct ApiToken {
    pub id: i32,
    pub name: String,
    pub user_id: i32,
    pub token: String,
    /// Comma separated list of scopes; empty grants every scope.
    pub scope: Option<String>,
    pub active: bool,
    pub last_used: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ApiToken {
    pub fn scopes(&self) -> Vec<&str> {
        self.scope
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn allows(&self, required: &str) -> bool {
        let scopes = self.scopes();
        scopes.is_empty() || scopes.contains(&required)
    }
}

/// How tokens are shown in the admin list: the secret is cut to a prefix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiTokenView {
    pub id: i32,
    pub name: String,
    pub user_id: i32,
    pub token: String,
    pub scope: Option<String>,
    pub active: bool,
    pub last_used: Option<DateTime<Utc>>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ApiTokenView {
    pub fn redacted(token: ApiToken) -> Self {
        let mut view = Self::revealed(token);
        view.token = redact(&view.token);
        view
    }

    /// Full secret; only returned right after creation or regeneration.
    pub fn revealed(token: ApiToken) -> Self {
        Self {
            id: token.id,
            name: token.name,
            user_id: token.user_id,
            token: token.token,
            scope: token.scope,
            active: token.active,
            last_used: token.last_used,
            note: token.note,
            created_at: token.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct ApiTokenCreate {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub user_id: i32,
    #[validate(length(max = 500))]
    pub scope: Option<String>,
    pub note: Option<String>,
}

/// A row of `api_logs`, written for every integration call.
#[derive(Debug, Clone)]
pub struct ApiLogEntry {
    pub endpoint: String,
    pub method: String,
    pub request_ip: Option<String>,
    pub user_id: Option<i32>,
    pub api_token_id: Option<i32>,
    pub response_status_code: i32,
    pub message: String,
    pub duration_ms: f64,
}

#[cfg(test)]
pub(crate) fn sample_token(scope: Option<&str>) -> ApiToken {
    ApiToken {
        id: 1,
        name: "Payroll sync".into(),
        user_id: 7,
        token: "abcdefghijklmnopqrstuvwxyz0123456789ABCDEFG".into(),
        scope: scope.map(String::from),
        active: true,
        last_used: None,
        note: None,
        created_at: Utc::now(),
    }
}
