use crate::{
    auth::AuthenticatedUser,
    crypto::CredentialCipher,
    error::AppError,
    models::Payslip,
    odoo::{self, OdooClient},
    routes::{current_user, employee_connection, stream_download},
};
use actix_web::{get, web, HttpResponse, Responder};
use sqlx::PgPool;

/// Done and paid payslips of the caller, newest first. Unlinked accounts get `[]`.
#[get("/payslips")]
pub async fn list_payslips(
    pool: web::Data<PgPool>,
    cipher: web::Data<CredentialCipher>,
    odoo_client: web::Data<OdooClient>,
    caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let user = current_user(&pool, &caller).await?;
    if user.odoo_employee_id.is_none() {
        return Ok(HttpResponse::Ok().json(Vec::<Payslip>::new()));
    }
    let (employee_id, conn) = employee_connection(&pool, &cipher, &user).await?;
    let payslips: Vec<Payslip> = odoo_client
        .get(&conn, &format!("/ess/api/payslips/{}", employee_id))
        .await?;
    Ok(HttpResponse::Ok().json(payslips))
}

#[get("/payslip/{payslip_id}/download")]
pub async fn download_payslip(
    pool: web::Data<PgPool>,
    cipher: web::Data<CredentialCipher>,
    odoo_client: web::Data<OdooClient>,
    caller: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let payslip_id = path.into_inner();
    let user = current_user(&pool, &caller).await?;
    let conn = odoo::tenant_connection(&pool, &cipher, user.tenant_id).await?;
    log::info!("User {} downloading payslip {}", user.email, payslip_id);
    let download = odoo_client
        .download(&conn, &format!("/ess/api/payslip/{}/download", payslip_id))
        .await?;
    Ok(stream_download(download))
}
