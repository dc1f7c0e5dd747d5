use crate::{db, error::AppError, integration::ApiCaller, models::UserProfile};
use actix_web::{get, web, HttpResponse, Responder};
use serde_json::json;
use sqlx::PgPool;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(auth_test).service(profile);
}

/// Lets an integrator check that their key works.
#[get("/auth-test")]
pub async fn auth_test(pool: web::Data<PgPool>, caller: ApiCaller) -> Result<impl Responder, AppError> {
    let login = db::users::find_by_id(&pool, caller.user_id())
        .await?
        .map(|user| user.email);
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Authentication successful.",
        "authenticated_user_login": login,
    })))
}

/// SaaS profile of the user the key was issued for.
#[get("/profile")]
pub async fn profile(pool: web::Data<PgPool>, caller: ApiCaller) -> Result<impl Responder, AppError> {
    caller.require_scope("profile")?;
    let user = db::users::find_by_id(&pool, caller.user_id())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(HttpResponse::Ok().json(UserProfile::from(&user)))
}
