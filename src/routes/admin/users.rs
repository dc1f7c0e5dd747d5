use crate::{
    auth::{check_password_strength, hash_password, AdminUser},
    db::{self, users::NewUser},
    error::AppError,
    models::{AdminUserCreate, AdminUserListItem, AdminUserUpdate, Pagination},
};
use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

const EMAIL_TAKEN: &str = "Email already registered by another SaaS user.";

fn user_not_found() -> AppError {
    AppError::NotFound("SaaS User not found.".into())
}

async fn ensure_tenant(pool: &PgPool, tenant_id: i32) -> Result<(), AppError> {
    if db::tenants::exists(pool, tenant_id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("Tenant with ID {} not found.", tenant_id)))
    }
}

/// Admins may edit their own account but not drop their own admin flag.
fn check_self_update(admin_id: i32, user_id: i32, update: &AdminUserUpdate) -> Result<(), AppError> {
    if admin_id == user_id && update.is_admin == Some(false) {
        return Err(AppError::Forbidden(
            "Administrators cannot revoke their own admin status.".into(),
        ));
    }
    Ok(())
}

#[get("/users")]
pub async fn list_users(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    page: web::Query<Pagination>,
) -> Result<impl Responder, AppError> {
    let (skip, limit) = page.bounds();
    let users: Vec<AdminUserListItem> = db::users::list(&pool, skip, limit)
        .await?
        .into_iter()
        .map(AdminUserListItem::from)
        .collect();
    Ok(HttpResponse::Ok().json(users))
}

#[post("/users")]
pub async fn create_user(
    pool: web::Data<PgPool>,
    admin: AdminUser,
    body: web::Json<AdminUserCreate>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    check_password_strength(&body.password)?;
    if db::users::email_taken(&pool, &body.email, None).await? {
        return Err(AppError::BadRequest(EMAIL_TAKEN.into()));
    }
    ensure_tenant(&pool, body.tenant_id).await?;

    let hashed_password = hash_password(&body.password)?;
    let user = db::users::create(
        &pool,
        &NewUser {
            email: body.email.trim(),
            hashed_password: &hashed_password,
            full_name: body.full_name.as_deref(),
            tenant_id: body.tenant_id,
            is_admin: body.is_admin,
            is_active: body.is_active,
            odoo_employee_id: body.odoo_employee_id,
            job_title: body.job_title.as_deref(),
            phone: body.phone.as_deref(),
        },
    )
    .await?;
    log::info!("Admin {} created user {} ({})", admin.id(), user.id, user.email);
    Ok(HttpResponse::Created().json(AdminUserListItem::from(user)))
}

#[get("/user/{user_id}")]
pub async fn get_user(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    path: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let user = db::users::find_by_id(&pool, path.into_inner())
        .await?
        .ok_or_else(user_not_found)?;
    Ok(HttpResponse::Ok().json(AdminUserListItem::from(user)))
}

/// Partial update
///
/// Only fields present in the body change; nullable fields can be cleared
/// with an explicit `null`.
#[put("/user/{user_id}")]
pub async fn update_user(
    pool: web::Data<PgPool>,
    admin: AdminUser,
    path: web::Path<i32>,
    body: web::Json<AdminUserUpdate>,
) -> Result<impl Responder, AppError> {
    let user_id = path.into_inner();
    body.validate()?;
    check_self_update(admin.id(), user_id, &body)?;

    let mut user = db::users::find_by_id(&pool, user_id)
        .await?
        .ok_or_else(user_not_found)?;

    if let Some(email) = &body.email {
        if db::users::email_taken(&pool, email, Some(user_id)).await? {
            return Err(AppError::BadRequest(EMAIL_TAKEN.into()));
        }
    }
    if let Some(tenant_id) = body.tenant_id {
        ensure_tenant(&pool, tenant_id).await?;
    }
    if let Some(password) = body.new_password() {
        check_password_strength(password)?;
        user.hashed_password = hash_password(password)?;
    }

    body.apply(&mut user);
    let user = db::users::save(&pool, &user).await?;
    log::info!("Admin {} updated user {}", admin.id(), user_id);
    Ok(HttpResponse::Ok().json(AdminUserListItem::from(user)))
}

#[delete("/user/{user_id}")]
pub async fn delete_user(
    pool: web::Data<PgPool>,
    admin: AdminUser,
    path: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let user_id = path.into_inner();
    if admin.id() == user_id {
        return Err(AppError::Forbidden(
            "Administrators cannot delete their own account.".into(),
        ));
    }
    if !db::users::delete(&pool, user_id).await? {
        return Err(user_not_found());
    }
    log::info!("Admin {} deleted user {}", admin.id(), user_id);
    Ok(HttpResponse::NoContent().finish())
}
