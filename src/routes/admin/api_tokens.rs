use crate::{
    auth::AdminUser,
    crypto::{generate_url_safe_token, redact},
    db,
    error::AppError,
    models::{ApiTokenCreate, ApiTokenView},
};
use actix_web::{delete, get, post, web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

fn token_not_found() -> AppError {
    AppError::NotFound("API token not found.".into())
}

/// Lists integration keys with the secret cut to a short prefix.
#[get("/api-tokens")]
pub async fn list_api_tokens(pool: web::Data<PgPool>, _admin: AdminUser) -> Result<impl Responder, AppError> {
    let tokens: Vec<ApiTokenView> = db::api_tokens::list(&pool)
        .await?
        .into_iter()
        .map(ApiTokenView::redacted)
        .collect();
    Ok(HttpResponse::Ok().json(tokens))
}

/// Issue an integration key
///
/// The full secret is part of this response only.
#[post("/api-tokens")]
pub async fn create_api_token(
    pool: web::Data<PgPool>,
    admin: AdminUser,
    body: web::Json<ApiTokenCreate>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    if db::users::find_by_id(&pool, body.user_id).await?.is_none() {
        return Err(AppError::NotFound(format!("User with ID {} not found.", body.user_id)));
    }

    let scope = body.scope.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let token = db::api_tokens::create(
        &pool,
        body.name.trim(),
        body.user_id,
        &generate_url_safe_token(),
        scope,
        body.note.as_deref(),
    )
    .await?;
    log::info!(
        "Admin {} issued API token {} ({}) for user {}",
        admin.id(),
        token.id,
        redact(&token.token),
        token.user_id
    );
    Ok(HttpResponse::Created().json(ApiTokenView::revealed(token)))
}

#[post("/api-token/{token_id}/toggle")]
pub async fn toggle_api_token(
    pool: web::Data<PgPool>,
    admin: AdminUser,
    path: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let token = db::api_tokens::toggle_active(&pool, path.into_inner())
        .await?
        .ok_or_else(token_not_found)?;
    log::info!("Admin {} set API token {} active={}", admin.id(), token.id, token.active);
    Ok(HttpResponse::Ok().json(ApiTokenView::redacted(token)))
}

/// Replaces the secret; the previous value stops working at once.
#[post("/api-token/{token_id}/regenerate")]
pub async fn regenerate_api_token(
    pool: web::Data<PgPool>,
    admin: AdminUser,
    path: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let token = db::api_tokens::regenerate(&pool, path.into_inner(), &generate_url_safe_token())
        .await?
        .ok_or_else(token_not_found)?;
    log::info!("Admin {} regenerated API token {}", admin.id(), token.id);
    Ok(HttpResponse::Ok().json(ApiTokenView::revealed(token)))
}

#[delete("/api-token/{token_id}")]
pub async fn delete_api_token(
    pool: web::Data<PgPool>,
    admin: AdminUser,
    path: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let token_id = path.into_inner();
    if !db::api_tokens::delete(&pool, token_id).await? {
        return Err(token_not_found());
    }
    log::info!("Admin {} deleted API token {}", admin.id(), token_id);
    Ok(HttpResponse::NoContent().finish())
}
