use sqlx::PgPool;

use crate::crypto::CredentialCipher;
use crate::db;
use crate::error::AppError;
use crate::models::User;
use crate::odoo::OdooConnection;

/// Looks up and decrypts the Odoo credentials of `tenant_id`.
pub async fn tenant_connection(
    pool: &PgPool,
    cipher: &CredentialCipher,
    tenant_id: i32,
) -> Result<OdooConnection, AppError> {
    let credential = db::odoo_credentials::find_by_tenant(pool, tenant_id)
        .await?
        .ok_or_else(|| {
            log::warn!("Tenant {} has no Odoo configuration", tenant_id);
            AppError::ServiceUnavailable("Odoo connection not configured.".into())
        })?;

    let api_key = cipher.decrypt(&credential.encrypted_odoo_api_key).map_err(|e| {
        log::error!("Could not decrypt Odoo API key of tenant {}: {}", tenant_id, e);
        AppError::InternalServerError("Security configuration error.".into())
    })?;

    Ok(OdooConnection::new(credential.odoo_base_url, api_key))
}

/// The linked `hr.employee` id, required by every employee endpoint.
pub fn employee_id(user: &User) -> Result<i32, AppError> {
    user.odoo_employee_id.ok_or_else(|| {
        AppError::BadRequest("User is not linked to an Odoo employee.".into())
    })
}
