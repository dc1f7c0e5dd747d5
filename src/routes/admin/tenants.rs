use crate::{
    auth::AdminUser,
    db,
    error::AppError,
    models::{Pagination, TenantCreate, TenantStatusUpdate},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

fn tenant_not_found() -> AppError {
    AppError::NotFound("Tenant not found.".into())
}

#[get("/tenants")]
pub async fn list_tenants(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    page: web::Query<Pagination>,
) -> Result<impl Responder, AppError> {
    let (skip, limit) = page.bounds();
    let tenants = db::tenants::list(&pool, skip, limit).await?;
    Ok(HttpResponse::Ok().json(tenants))
}

/// Create a tenant
///
/// Names are unique; a duplicate answers 400.
#[post("/tenants")]
pub async fn create_tenant(
    pool: web::Data<PgPool>,
    admin: AdminUser,
    body: web::Json<TenantCreate>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    let name = body.name.trim();
    if db::tenants::name_taken(&pool, name).await? {
        return Err(AppError::BadRequest(format!(
            "Tenant with name '{}' already exists.",
            name
        )));
    }

    let tenant = db::tenants::create(&pool, name, body.is_active).await?;
    log::info!("Admin {} created tenant {} ({})", admin.id(), tenant.id, tenant.name);
    Ok(HttpResponse::Created().json(tenant))
}

#[get("/tenant/{tenant_id}")]
pub async fn get_tenant(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let tenant = db::tenants::find_by_id(&pool, path.into_inner())
        .await?
        .ok_or_else(tenant_not_found)?;
    Ok(HttpResponse::Ok().json(tenant))
}

#[put("/tenant/{tenant_id}/status")]
pub async fn update_tenant_status(
    pool: web::Data<PgPool>,
    admin: AdminUser,
    path: web::Path<i32>,
    body: web::Json<TenantStatusUpdate>,
) -> Result<impl Responder, AppError> {
    let tenant_id = path.into_inner();
    let tenant = db::tenants::set_active(&pool, tenant_id, body.is_active)
        .await?
        .ok_or_else(tenant_not_found)?;
    log::info!(
        "Admin {} set tenant {} active={}",
        admin.id(),
        tenant_id,
        body.is_active
    );
    Ok(HttpResponse::Ok().json(tenant))
}

/// Delete a tenant
///
/// Refused with 409 while users still belong to it. Its Odoo credentials go with it.
#[delete("/tenant/{tenant_id}")]
pub async fn delete_tenant(
    pool: web::Data<PgPool>,
    admin: AdminUser,
    path: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let tenant_id = path.into_inner();
    if !db::tenants::exists(&pool, tenant_id).await? {
        return Err(tenant_not_found());
    }

    let users = db::tenants::count_users(&pool, tenant_id).await?;
    if users > 0 {
        return Err(AppError::Conflict(format!(
            "Tenant still has {} user(s). Reassign or delete them first.",
            users
        )));
    }

    if !db::tenants::delete(&pool, tenant_id).await? {
        return Err(tenant_not_found());
    }
    log::info!("Admin {} deleted tenant {}", admin.id(), tenant_id);
    Ok(HttpResponse::NoContent().finish())
}
