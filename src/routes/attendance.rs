use crate::{
    auth::AuthenticatedUser,
    crypto::CredentialCipher,
    error::AppError,
    models::{
        attendance::AttendanceActionResponse, AttendanceRecord, AttendanceState, AttendanceStatus,
        TodayLog,
    },
    odoo::{OdooClient, OdooForm},
    routes::{current_user, degrades, employee_connection},
};
use actix_web::{get, post, web, HttpResponse, Responder};
use sqlx::PgPool;

const ATTENDANCE_FALLBACK: &[u16] = &[403, 404, 500, 503];
const NOT_LINKED: &str = "Not linked to HR system.";

#[get("/attendance/status")]
pub async fn status(
    pool: web::Data<PgPool>,
    cipher: web::Data<CredentialCipher>,
    odoo_client: web::Data<OdooClient>,
    caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let user = current_user(&pool, &caller).await?;
    if user.odoo_employee_id.is_none() {
        return Ok(HttpResponse::Ok().json(AttendanceStatus::with_message(AttendanceState::Unknown, NOT_LINKED)));
    }

    let result = match employee_connection(&pool, &cipher, &user).await {
        Ok((employee_id, conn)) => {
            odoo_client
                .get::<AttendanceStatus>(&conn, &format!("/ess/api/attendance/status/{}", employee_id))
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(current) => Ok(HttpResponse::Ok().json(current)),
        Err(e) if degrades(&e, ATTENDANCE_FALLBACK) => {
            log::warn!("Attendance status for {} unavailable: {}", user.email, e);
            Ok(HttpResponse::Ok().json(AttendanceStatus::with_message(
                AttendanceState::Error,
                "Could not retrieve status from HR system.",
            )))
        }
        Err(e) => Err(e),
    }
}

async fn record_action(
    pool: &PgPool,
    cipher: &CredentialCipher,
    odoo_client: &OdooClient,
    caller: &AuthenticatedUser,
    action: &str,
) -> Result<HttpResponse, AppError> {
    let user = current_user(pool, caller).await?;
    let (employee_id, conn) = employee_connection(pool, cipher, &user).await?;
    let form = OdooForm::new().text("employee_id", employee_id);
    let response: AttendanceActionResponse = odoo_client
        .request_multipart(&conn, &format!("/ess/api/attendance/{}", action), form)
        .await?;
    log::info!("Employee {} {}", employee_id, action);
    Ok(HttpResponse::Ok().json(response))
}

#[post("/attendance/check-in")]
pub async fn check_in(
    pool: web::Data<PgPool>,
    cipher: web::Data<CredentialCipher>,
    odoo_client: web::Data<OdooClient>,
    caller: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    record_action(&pool, &cipher, &odoo_client, &caller, "check-in").await
}

#[post("/attendance/check-out")]
pub async fn check_out(
    pool: web::Data<PgPool>,
    cipher: web::Data<CredentialCipher>,
    odoo_client: web::Data<OdooClient>,
    caller: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    record_action(&pool, &cipher, &odoo_client, &caller, "check-out").await
}

#[get("/attendance/today-log")]
pub async fn today_log(
    pool: web::Data<PgPool>,
    cipher: web::Data<CredentialCipher>,
    odoo_client: web::Data<OdooClient>,
    caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let user = current_user(&pool, &caller).await?;
    let linked_id = match user.odoo_employee_id {
        Some(id) => id,
        None => return Ok(HttpResponse::Ok().json(TodayLog::unavailable(None, NOT_LINKED))),
    };

    let result = match employee_connection(&pool, &cipher, &user).await {
        Ok((employee_id, conn)) => odoo_client
            .get::<Vec<AttendanceRecord>>(&conn, &format!("/ess/api/attendance/today/{}", employee_id))
            .await
            .map(|records| TodayLog::for_employee(employee_id, records)),
        Err(e) => Err(e),
    };

    match result {
        Ok(today) => Ok(HttpResponse::Ok().json(today)),
        Err(e) if degrades(&e, ATTENDANCE_FALLBACK) => {
            log::warn!("Attendance log for {} unavailable: {}", user.email, e);
            Ok(HttpResponse::Ok().json(TodayLog::unavailable(
                Some(linked_id),
                "Could not retrieve attendance log.",
            )))
        }
        Err(e) => Err(e),
    }
}
