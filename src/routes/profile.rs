use crate::{
    auth::AuthenticatedUser,
    crypto::CredentialCipher,
    error::AppError,
    models::{OdooEmployee, UserProfile},
    odoo::{self, OdooClient},
    routes::current_user,
};
use actix_web::{get, web, HttpResponse, Responder};
use sqlx::PgPool;

/// My profile
///
/// SaaS account data, overlaid with the linked Odoo employee record when it
/// can be fetched. Any Odoo problem falls back to the SaaS data alone.
#[get("/users/me")]
pub async fn read_me(
    pool: web::Data<PgPool>,
    cipher: web::Data<CredentialCipher>,
    odoo_client: web::Data<OdooClient>,
    caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let user = current_user(&pool, &caller).await?;
    let profile = UserProfile::from(&user);

    let Some(employee_id) = user.odoo_employee_id else {
        log::warn!("User {} has no Odoo employee mapping, returning SaaS profile", user.email);
        return Ok(HttpResponse::Ok().json(profile));
    };

    let employee = match odoo::tenant_connection(&pool, &cipher, user.tenant_id).await {
        Ok(conn) => {
            odoo_client
                .get::<OdooEmployee>(&conn, &format!("/ess/api/employee/{}", employee_id))
                .await
        }
        Err(e) => Err(e),
    };

    match employee {
        Ok(employee) => Ok(HttpResponse::Ok().json(profile.merge_odoo(employee))),
        Err(e) => {
            log::warn!(
                "Could not fetch Odoo profile of {} (employee {}): {}. Returning SaaS profile",
                user.email,
                employee_id,
                e
            );
            Ok(HttpResponse::Ok().json(profile))
        }
    }
}
