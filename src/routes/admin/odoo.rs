use crate::{
    auth::AdminUser,
    crypto::CredentialCipher,
    db,
    error::AppError,
    models::{
        odoo_config::{
            ConnectionTestStatus, EmployeeSearchQuery, OdooConnectionTestResponse,
            OdooEmployeeSearchResult,
        },
        OdooConfigDisplay, OdooConfigUpdate,
    },
    odoo::{OdooClient, OdooConnection},
};
use actix_web::{get, post, put, web, HttpResponse, Responder};
use serde_json::Value;
use sqlx::PgPool;
use validator::Validate;

async fn ensure_tenant(pool: &PgPool, tenant_id: i32) -> Result<(), AppError> {
    if db::tenants::exists(pool, tenant_id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound("Tenant not found.".into()))
    }
}

#[get("/tenant/{tenant_id}/odoo-config")]
pub async fn get_odoo_config(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let tenant_id = path.into_inner();
    ensure_tenant(&pool, tenant_id).await?;
    let display = match db::odoo_credentials::find_by_tenant(&pool, tenant_id).await? {
        Some(credential) => OdooConfigDisplay::from(credential),
        None => OdooConfigDisplay::unconfigured(tenant_id),
    };
    Ok(HttpResponse::Ok().json(display))
}

/// Store a tenant's Odoo connection
///
/// The API key is encrypted before it reaches the database and never returned.
#[put("/tenant/{tenant_id}/odoo-config")]
pub async fn update_odoo_config(
    pool: web::Data<PgPool>,
    cipher: web::Data<CredentialCipher>,
    admin: AdminUser,
    path: web::Path<i32>,
    body: web::Json<OdooConfigUpdate>,
) -> Result<impl Responder, AppError> {
    let tenant_id = path.into_inner();
    body.validate()?;
    ensure_tenant(&pool, tenant_id).await?;

    let encrypted = cipher.encrypt(&body.odoo_api_key)?;
    let credential = db::odoo_credentials::upsert(
        &pool,
        tenant_id,
        body.odoo_base_url.trim(),
        body.odoo_db_name.trim(),
        body.odoo_username.trim(),
        &encrypted,
    )
    .await?;
    log::info!(
        "Admin {} updated Odoo configuration of tenant {} ({})",
        admin.id(),
        tenant_id,
        credential.odoo_base_url
    );
    Ok(HttpResponse::Ok().json(OdooConfigDisplay::from(credential)))
}

/// Turns the answer of Odoo's `/ess/api/auth-test` into the admin-facing verdict.
fn connection_test_outcome(result: Result<Value, AppError>) -> OdooConnectionTestResponse {
    match result {
        Ok(body) if body.get("status").and_then(Value::as_str) == Some("success") => {
            let login = body
                .get("authenticated_user_login")
                .and_then(Value::as_str)
                .map(String::from);
            OdooConnectionTestResponse {
                status: ConnectionTestStatus::Success,
                message: format!(
                    "Connection successful. Authenticated as Odoo user: {}",
                    login.as_deref().unwrap_or("N/A")
                ),
                odoo_user_login: login,
            }
        }
        Ok(_) => OdooConnectionTestResponse::failure(
            "Odoo auth-test endpoint returned unexpected success format.",
        ),
        Err(e) => OdooConnectionTestResponse::failure(format!("Connection failed: {}", e.message())),
    }
}

/// Check a tenant's Odoo connection
///
/// Always 200: upstream problems are reported in the body.
#[post("/tenant/{tenant_id}/test-odoo-connection")]
pub async fn test_odoo_connection(
    pool: web::Data<PgPool>,
    cipher: web::Data<CredentialCipher>,
    odoo_client: web::Data<OdooClient>,
    admin: AdminUser,
    path: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let tenant_id = path.into_inner();
    ensure_tenant(&pool, tenant_id).await?;
    log::info!("Admin {} testing Odoo connection of tenant {}", admin.id(), tenant_id);

    let credential = match db::odoo_credentials::find_by_tenant(&pool, tenant_id).await? {
        Some(credential) => credential,
        None => {
            return Ok(HttpResponse::Ok().json(OdooConnectionTestResponse::failure(
                "Odoo credentials are not configured for this tenant.",
            )))
        }
    };
    let api_key = match cipher.decrypt(&credential.encrypted_odoo_api_key) {
        Ok(key) => key,
        Err(e) => {
            log::error!("Could not decrypt Odoo API key of tenant {}: {}", tenant_id, e);
            return Ok(HttpResponse::Ok().json(OdooConnectionTestResponse::failure(
                "Security configuration error: Could not decrypt API key.",
            )));
        }
    };

    let conn = OdooConnection::new(credential.odoo_base_url, api_key);
    let result = odoo_client.get::<Value>(&conn, "/ess/api/auth-test").await;
    if let Err(e) = &result {
        log::warn!("Odoo connection test failed for tenant {}: {}", tenant_id, e);
    }
    Ok(HttpResponse::Ok().json(connection_test_outcome(result)))
}

/// Search employees in a tenant's Odoo, used when linking SaaS accounts.
#[get("/odoo-employees/search")]
pub async fn search_employees(
    pool: web::Data<PgPool>,
    cipher: web::Data<CredentialCipher>,
    odoo_client: web::Data<OdooClient>,
    _admin: AdminUser,
    query: web::Query<EmployeeSearchQuery>,
) -> Result<impl Responder, AppError> {
    let tenant_id = query.tenant_id;
    let credential = db::odoo_credentials::find_by_tenant(&pool, tenant_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Odoo configuration not found for tenant ID {}.", tenant_id))
        })?;
    let api_key = cipher.decrypt(&credential.encrypted_odoo_api_key).map_err(|e| {
        log::error!("Could not decrypt Odoo API key of tenant {}: {}", tenant_id, e);
        AppError::InternalServerError("Security configuration error for tenant's Odoo connection.".into())
    })?;
    let conn = OdooConnection::new(credential.odoo_base_url, api_key);

    let mut params = vec![("limit", query.limit.to_string())];
    if let Some(term) = query.term.as_deref().filter(|t| !t.trim().is_empty()) {
        params.push(("term", term.trim().to_string()));
    }
    let employees: Vec<OdooEmployeeSearchResult> = odoo_client
        .get_with_query(&conn, "/ess/api/admin/employees/search", &params)
        .await?;
    Ok(HttpResponse::Ok().json(employees))
}
