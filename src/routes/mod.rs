pub mod admin;
pub mod attendance;
pub mod auth;
pub mod documents;
pub mod expenses;
pub mod health;
pub mod integration;
pub mod leave;
pub mod payslips;
pub mod profile;

use actix_web::{web, HttpResponse, ResponseError};
use sqlx::PgPool;

use crate::auth::AuthenticatedUser;
use crate::crypto::CredentialCipher;
use crate::db;
use crate::error::AppError;
use crate::models::User;
use crate::odoo::{self, OdooConnection, OdooDownload};

/// Routes under `/api/v1` that authenticate with a session token.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::login)
        .service(
            web::scope("/auth")
                .service(auth::refresh_token)
                .service(auth::request_password_reset)
                .service(auth::reset_password),
        )
        .service(profile::read_me)
        .service(leave::leave_types)
        .service(leave::submit_leave_request)
        .service(
            web::scope("/dashboard")
                .service(leave::pending_leaves_count)
                .service(leave::next_day_off),
        )
        .service(payslips::list_payslips)
        .service(payslips::download_payslip)
        .service(expenses::submit_expense)
        .service(documents::list_documents)
        .service(documents::upload_document)
        .service(documents::download_document)
        .service(documents::delete_document)
        .service(attendance::status)
        .service(attendance::check_in)
        .service(attendance::check_out)
        .service(attendance::today_log)
        .service(web::scope("/admin").configure(admin::config));
}

/// The caller's account, re-read so deactivation takes effect immediately.
pub(crate) async fn current_user(pool: &PgPool, caller: &AuthenticatedUser) -> Result<User, AppError> {
    let user = db::users::find_by_id(pool, caller.id())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    if !user.is_active {
        return Err(AppError::Forbidden("User account is inactive.".into()));
    }
    Ok(user)
}

/// Employee id and tenant connection for a user acting on their own HR data.
pub(crate) async fn employee_connection(
    pool: &PgPool,
    cipher: &CredentialCipher,
    user: &User,
) -> Result<(i32, OdooConnection), AppError> {
    let employee_id = odoo::employee_id(user)?;
    let conn = odoo::tenant_connection(pool, cipher, user.tenant_id).await?;
    Ok((employee_id, conn))
}

/// Whether an Odoo failure with this status should be turned into a placeholder answer.
pub(crate) fn degrades(error: &AppError, statuses: &[u16]) -> bool {
    statuses.contains(&error.status_code().as_u16())
}

/// Passes an Odoo file through to the browser chunk by chunk.
pub(crate) fn stream_download(download: OdooDownload) -> HttpResponse {
    let mut response = HttpResponse::Ok();
    response
        .content_type(download.content_type)
        .insert_header(("Content-Disposition", download.content_disposition));
    if let Some(length) = download.content_length {
        response.no_chunking(length);
    }
    response.streaming(download.body)
}
