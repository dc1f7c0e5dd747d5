use crate::{
    auth::AuthenticatedUser,
    crypto::CredentialCipher,
    error::AppError,
    models::{
        DocumentUploadResponse, EmployeeDocument, MessageResponse, OdooUploadResponse,
        UploadedAttachment,
    },
    odoo::{self, OdooClient, OdooForm},
    routes::{current_user, employee_connection, stream_download},
    upload::UploadForm,
};
use actix_multipart::Multipart;
use actix_web::{delete, get, post, web, HttpResponse, Responder};
use serde_json::Value;
use sqlx::PgPool;

/// Documents attached to the caller's employee record.
///
/// The list page must always render: unlinked accounts and Odoo failures
/// give `[]`. Only a 401 from Odoo is passed on.
#[get("/documents")]
pub async fn list_documents(
    pool: web::Data<PgPool>,
    cipher: web::Data<CredentialCipher>,
    odoo_client: web::Data<OdooClient>,
    caller: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let user = current_user(&pool, &caller).await?;
    if user.odoo_employee_id.is_none() {
        log::warn!("User {} cannot list documents: no Odoo employee mapping", user.email);
        return Ok(HttpResponse::Ok().json(Vec::<EmployeeDocument>::new()));
    }

    let result = match employee_connection(&pool, &cipher, &user).await {
        Ok((employee_id, conn)) => {
            odoo_client
                .get::<Vec<EmployeeDocument>>(&conn, &format!("/ess/api/employee/{}/documents", employee_id))
                .await
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(documents) => Ok(HttpResponse::Ok().json(documents)),
        Err(AppError::Upstream { status: 401, message }) => Err(AppError::Upstream { status: 401, message }),
        Err(e) => {
            log::error!("Error listing documents for {}: {}", user.email, e);
            Ok(HttpResponse::Ok().json(Vec::<EmployeeDocument>::new()))
        }
    }
}

/// Upload a document
///
/// Multipart form with `document_type` and `file`.
#[post("/documents")]
pub async fn upload_document(
    pool: web::Data<PgPool>,
    cipher: web::Data<CredentialCipher>,
    odoo_client: web::Data<OdooClient>,
    caller: AuthenticatedUser,
    payload: Multipart,
) -> Result<impl Responder, AppError> {
    let user = current_user(&pool, &caller).await?;
    let (employee_id, conn) = employee_connection(&pool, &cipher, &user).await?;

    let mut upload = UploadForm::read(payload).await?;
    let document_type = upload.required_field("document_type")?.to_string();
    let file = upload.take_file("file")?;
    let sent = UploadedAttachment {
        attachment_id: 0,
        filename: file.filename.clone(),
        document_type: document_type.clone(),
        employee_id,
    };
    log::info!(
        "User {} uploading '{}' ({} bytes) as {}",
        user.email,
        file.filename,
        file.bytes.len(),
        document_type
    );

    let form = OdooForm::new()
        .text("document_type", &document_type)
        .file(file.into_odoo_file("file"));
    let uploaded: OdooUploadResponse = odoo_client
        .request_multipart(&conn, &format!("/ess/api/employee/{}/document", employee_id), form)
        .await?;

    Ok(HttpResponse::Created().json(DocumentUploadResponse::from_odoo(uploaded, &sent)))
}

#[get("/document/{document_id}/download")]
pub async fn download_document(
    pool: web::Data<PgPool>,
    cipher: web::Data<CredentialCipher>,
    odoo_client: web::Data<OdooClient>,
    caller: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let document_id = path.into_inner();
    let user = current_user(&pool, &caller).await?;
    let conn = odoo::tenant_connection(&pool, &cipher, user.tenant_id).await?;
    let download = odoo_client
        .download(&conn, &format!("/ess/api/attachment/{}/download", document_id))
        .await?;
    Ok(stream_download(download))
}

#[delete("/document/{document_id}")]
pub async fn delete_document(
    pool: web::Data<PgPool>,
    cipher: web::Data<CredentialCipher>,
    odoo_client: web::Data<OdooClient>,
    caller: AuthenticatedUser,
    path: web::Path<i32>,
) -> Result<impl Responder, AppError> {
    let document_id = path.into_inner();
    let user = current_user(&pool, &caller).await?;
    // Odoo checks that the attachment belongs to an employee of this tenant.
    let conn = odoo::tenant_connection(&pool, &cipher, user.tenant_id).await?;

    let response: Value = odoo_client
        .delete(&conn, &format!("/ess/api/attachment/{}", document_id))
        .await?;
    log::info!("User {} deleted document {}", user.email, document_id);

    let message = response
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Document deletion processed by Odoo.");
    Ok(HttpResponse::Ok().json(MessageResponse::new(message)))
}
