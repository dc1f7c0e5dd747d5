use crate::{
    auth::AuthenticatedUser,
    crypto::CredentialCipher,
    error::AppError,
    models::{ExpenseForm, ExpenseSubmitResponse},
    odoo::{OdooClient, OdooForm},
    routes::{current_user, employee_connection},
    upload::UploadForm,
};
use actix_multipart::Multipart;
use actix_web::{post, web, HttpResponse, Responder};
use sqlx::PgPool;

/// Submit an expense
///
/// Multipart form with `description`, `amount`, `date` and a `receipt`
/// file, forwarded to Odoo together with the caller's employee id.
#[post("/expenses")]
pub async fn submit_expense(
    pool: web::Data<PgPool>,
    cipher: web::Data<CredentialCipher>,
    odoo_client: web::Data<OdooClient>,
    caller: AuthenticatedUser,
    payload: Multipart,
) -> Result<impl Responder, AppError> {
    let user = current_user(&pool, &caller).await?;
    let (employee_id, conn) = employee_connection(&pool, &cipher, &user).await?;

    let mut upload = UploadForm::read(payload).await?;
    let expense = ExpenseForm::parse(
        upload.field("description"),
        upload.field("amount"),
        upload.field("date"),
    )
    .map_err(AppError::BadRequest)?;
    let receipt = upload.take_file("receipt")?;

    let form = OdooForm::new()
        .text("employee_id", employee_id)
        .text("description", &expense.description)
        .text("amount", expense.amount)
        .text("date", expense.date.format("%Y-%m-%d"))
        .file(receipt.into_odoo_file("receipt"));

    let response: ExpenseSubmitResponse = odoo_client
        .request_multipart(&conn, "/ess/api/expenses", form)
        .await?;
    log::info!(
        "Expense '{}' ({}) submitted for employee {}",
        expense.description,
        expense.amount,
        employee_id
    );
    Ok(HttpResponse::Created().json(response))
}
