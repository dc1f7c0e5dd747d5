use crate::{
    auth::AuthenticatedUser,
    crypto::CredentialCipher,
    error::AppError,
    models::{
        leave::OdooLeavePayload, LeaveRequestInput, LeaveSubmitResponse, LeaveType, NextDayOff,
        PendingLeavesCount,
    },
    odoo::OdooClient,
    routes::{current_user, degrades, employee_connection},
};
use actix_web::{get, post, web, HttpResponse, Responder};
use sqlx::PgPool;
use validator::Validate;

/// Upstream statuses that the dashboard widgets absorb.
const DASHBOARD_FALLBACK: &[u16] = &[400, 403, 404, 500, 503];

#[get("/leave-types")]
pub async fn leave_types(
    pool: web::Data<PgPool>,
    cipher: web::Data<CredentialCipher>,
    odoo_client: web::Data<OdooClient>,
    caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let user = current_user(&pool, &caller).await?;
    let (_, conn) = employee_connection(&pool, &cipher, &user).await?;
    let types: Vec<LeaveType> = odoo_client.get(&conn, "/ess/api/leave-types").await?;
    Ok(HttpResponse::Ok().json(types))
}

/// Submit a leave request
///
/// Creates an `hr.leave` for the caller's employee. Answers 201 with
/// Odoo's confirmation.
#[post("/leave-request")]
pub async fn submit_leave_request(
    pool: web::Data<PgPool>,
    cipher: web::Data<CredentialCipher>,
    odoo_client: web::Data<OdooClient>,
    caller: AuthenticatedUser,
    body: web::Json<LeaveRequestInput>,
) -> Result<impl Responder, AppError> {
    body.validate()?;
    let user = current_user(&pool, &caller).await?;
    let (employee_id, conn) = employee_connection(&pool, &cipher, &user).await?;

    let payload = OdooLeavePayload::new(employee_id, &body);
    let response: LeaveSubmitResponse = odoo_client.post(&conn, "/ess/api/leave", &payload).await?;
    log::info!(
        "Leave request {:?} submitted for employee {} ({} to {})",
        response.odoo_leave_id,
        employee_id,
        body.from_date,
        body.to_date
    );
    Ok(HttpResponse::Created().json(response))
}

#[get("/pending-leaves-count")]
pub async fn pending_leaves_count(
    pool: web::Data<PgPool>,
    cipher: web::Data<CredentialCipher>,
    odoo_client: web::Data<OdooClient>,
    caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let user = current_user(&pool, &caller).await?;
    let fallback = PendingLeavesCount {
        employee_id: user.odoo_employee_id.unwrap_or(0),
        pending_leave_count: 0,
    };

    let result = match employee_connection(&pool, &cipher, &user).await {
        Ok((employee_id, conn)) => {
            odoo_client
                .get::<PendingLeavesCount>(&conn, &format!("/ess/api/leaves/pending-count/{}", employee_id))
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(count) => Ok(HttpResponse::Ok().json(count)),
        Err(e) if degrades(&e, DASHBOARD_FALLBACK) => {
            log::warn!("Dashboard pending leaves for {} failed ({}), returning 0", user.email, e);
            Ok(HttpResponse::Ok().json(fallback))
        }
        Err(e) => Err(e),
    }
}

#[get("/next-day-off")]
pub async fn next_day_off(
    pool: web::Data<PgPool>,
    cipher: web::Data<CredentialCipher>,
    odoo_client: web::Data<OdooClient>,
    caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let user = current_user(&pool, &caller).await?;
    let fallback_id = user.odoo_employee_id.unwrap_or(0);

    let result = match employee_connection(&pool, &cipher, &user).await {
        Ok((employee_id, conn)) => {
            odoo_client
                .get::<NextDayOff>(&conn, &format!("/ess/api/leaves/next-off/{}", employee_id))
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(next) if next.next_day_off.is_some() => Ok(HttpResponse::Ok().json(next)),
        Ok(next) => Ok(HttpResponse::Ok().json(NextDayOff::unavailable(
            next.employee_id,
            "No upcoming approved leave found.",
        ))),
        Err(e) if degrades(&e, DASHBOARD_FALLBACK) => {
            log::warn!("Dashboard next day off for {} failed ({})", user.email, e);
            Ok(HttpResponse::Ok().json(NextDayOff::unavailable(
                fallback_id,
                "Could not retrieve leave information.",
            )))
        }
        Err(e) => Err(e),
    }
}
