use crate::{
    auth::{
        check_password_strength, hash_password, verify_password, LoginForm, PasswordResetRequest,
        RefreshTokenRequest, ResetPasswordRequest, TokenResponse, TokenService, TokenType,
    },
    config::Config,
    crypto::{generate_url_safe_token, redact, sha256_hex},
    db::{self, refresh_tokens::Consumption},
    error::AppError,
    mailer::{password_reset_mail, Mailer},
    models::{MessageResponse, User},
};
use actix_web::{post, web, HttpResponse, Responder};
use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

const RESET_TOKEN_TTL_MINUTES: i64 = 60;
const RESET_REQUESTED_MESSAGE: &str =
    "If an account with that email exists, a password reset link has been sent.";

/// Issues an access/refresh pair and records the refresh token's id.
async fn issue_session(pool: &PgPool, tokens: &TokenService, user: &User) -> Result<TokenResponse, AppError> {
    let jti = Uuid::new_v4().to_string();
    let access_token = tokens.issue_access(user.id, &user.email, user.is_admin)?;
    let refresh = tokens.issue_refresh(user.id, &user.email, user.is_admin, &jti)?;
    db::refresh_tokens::create(pool, &jti, user.id, Utc::now() + tokens.refresh_ttl()).await?;
    Ok(TokenResponse::bearer(access_token, refresh))
}

/// Login
///
/// OAuth2 password form: `username` is the account email. Answers 401 on
/// unknown email or wrong password and 400 for deactivated accounts.
#[post("/login")]
pub async fn login(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    form: web::Form<LoginForm>,
) -> Result<impl Responder, AppError> {
    form.validate()?;

    let user = db::users::find_by_email(&pool, form.username.trim()).await?;
    let user = match user {
        Some(user) if verify_password(&form.password, &user.hashed_password)? => user,
        _ => {
            log::warn!("Failed login attempt for {}", form.username);
            return Err(AppError::Unauthorized("Incorrect email or password".into()));
        }
    };
    if !user.is_active {
        return Err(AppError::BadRequest("Inactive user".into()));
    }

    let session = issue_session(&pool, &tokens, &user).await?;
    log::info!("User {} logged in", user.email);
    Ok(HttpResponse::Ok().json(session))
}

/// Exchanges a refresh token for a new pair.
///
/// Each refresh token works once. Presenting a spent one is treated as
/// theft: every refresh token of that user is revoked.
#[post("/refresh-token")]
pub async fn refresh_token(
    pool: web::Data<PgPool>,
    tokens: web::Data<TokenService>,
    body: web::Json<RefreshTokenRequest>,
) -> Result<impl Responder, AppError> {
    let invalid = || AppError::Unauthorized("Invalid or expired refresh token".into());

    let claims = tokens
        .verify(&body.refresh_token, TokenType::Refresh)
        .map_err(|_| invalid())?;
    let jti = claims.jti.as_deref().ok_or_else(invalid)?;

    match db::refresh_tokens::consume(&pool, jti).await? {
        Consumption::Consumed { user_id } if user_id == claims.sub => {}
        Consumption::Reused { user_id } => {
            let revoked = db::refresh_tokens::revoke_all(&pool, user_id).await?;
            log::warn!(
                "Refresh token reuse for user {}; revoked {} outstanding tokens",
                user_id,
                revoked
            );
            return Err(invalid());
        }
        _ => return Err(invalid()),
    }

    let user = db::users::find_by_id(&pool, claims.sub)
        .await?
        .filter(|user| user.is_active)
        .ok_or_else(|| AppError::Unauthorized("User not found or inactive".into()))?;

    let session = issue_session(&pool, &tokens, &user).await?;
    Ok(HttpResponse::Ok().json(session))
}

/// Mails a reset link to active accounts. The answer is the same whether
/// or not the email is known.
#[post("/request-password-reset")]
pub async fn request_password_reset(
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    mailer: web::Data<dyn Mailer>,
    body: web::Json<PasswordResetRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    log::info!("Password reset requested for {}", body.email);

    match db::users::find_by_email(&pool, &body.email).await? {
        Some(user) if user.is_active => {
            let token = generate_url_safe_token();
            let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);
            db::users::set_reset_token(&pool, user.id, &sha256_hex(&token), expires_at).await?;

            let name = user.full_name.as_deref().unwrap_or(&user.email);
            let mail = password_reset_mail(
                &config.mail_from,
                &user.email,
                name,
                &config.password_reset_link(&token),
            );
            mailer.send(mail).await.map_err(|e| {
                log::error!("Failed to send password reset email to {}: {}", user.email, e);
                AppError::InternalServerError(
                    "Could not send password reset email. Please try again later.".into(),
                )
            })?;
        }
        _ => log::warn!("Password reset requested for unknown or inactive email {}", body.email),
    }

    Ok(HttpResponse::Ok().json(MessageResponse::new(RESET_REQUESTED_MESSAGE)))
}

#[post("/reset-password")]
pub async fn reset_password(
    pool: web::Data<PgPool>,
    body: web::Json<ResetPasswordRequest>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    check_password_strength(&body.new_password)?;

    let hashed = hash_password(&body.new_password)?;
    let user = db::users::reset_password_with_token(&pool, &sha256_hex(&body.token), &hashed)
        .await?
        .ok_or_else(|| {
            log::warn!("Invalid or expired password reset token {}", redact(&body.token));
            AppError::BadRequest("Invalid or expired password reset token.".into())
        })?;

    db::refresh_tokens::revoke_all(&pool, user.id).await?;
    log::info!("Password reset for user {}", user.email);

    Ok(HttpResponse::Ok().json(MessageResponse::new(
        "Your password has been successfully reset. You can now log in with your new password.",
    )))
}
