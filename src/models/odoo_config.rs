use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// A tenant's Odoo connection. The API key is only ever held encrypted.
#[derive(Debug, Clone, FromRow)]
pub struct OdooCredential {
    pub id: i32,
    pub tenant_id: i32,
    pub odoo_base_url: String,
    pub odoo_db_name: String,
    pub odoo_username: String,
    pub encrypted_odoo_api_key: String,
}

/// What admins see of a tenant's configuration: everything except the key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OdooConfigDisplay {
    pub tenant_id: i32,
    pub odoo_base_url: Option<String>,
    pub odoo_db_name: Option<String>,
    pub odoo_username: Option<String>,
}

impl OdooConfigDisplay {
    pub fn unconfigured(tenant_id: i32) -> Self {
        Self {
            tenant_id,
            odoo_base_url: None,
            odoo_db_name: None,
            odoo_username: None,
        }
    }
}

impl From<OdooCredential> for OdooConfigDisplay {
    fn from(credential: OdooCredential) -> Self {
        Self {
            tenant_id: credential.tenant_id,
            odoo_base_url: Some(credential.odoo_base_url),
            odoo_db_name: Some(credential.odoo_db_name),
            odoo_username: Some(credential.odoo_username),
        }
    }
}

/// Payload of `PUT /admin/tenant/{id}/odoo-config`; the key arrives in plain text.
#[derive(Debug, Deserialize, Validate)]
pub struct OdooConfigUpdate {
    #[validate(url)]
    pub odoo_base_url: String,
    #[validate(length(min = 1, max = 200))]
    pub odoo_db_name: String,
    #[validate(length(min = 1, max = 200))]
    pub odoo_username: String,
    #[validate(length(min = 1))]
    pub odoo_api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionTestStatus {
    Success,
    Failure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OdooConnectionTestResponse {
    pub status: ConnectionTestStatus,
    pub message: String,
    pub odoo_user_login: Option<String>,
}

impl OdooConnectionTestResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: ConnectionTestStatus::Failure,
            message: message.into(),
            odoo_user_login: None,
        }
    }
}

/// Query of `GET /admin/odoo-employees/search`.
#[derive(Debug, Deserialize)]
pub struct EmployeeSearchQuery {
    pub tenant_id: i32,
    pub term: Option<String>,
    #[serde(default = "default_search_limit")]
    pub limit: u32,
}

fn default_search_limit() -> u32 {
    10
}

/// An `hr.employee` record as returned by the connector's search endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OdooEmployeeSearchResult {
    pub id: i32,
    pub name: Option<String>,
    pub work_email: Option<String>,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub work_phone: Option<String>,
    pub mobile_phone: Option<String>,
}
