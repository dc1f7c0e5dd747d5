//! Exercises `OdooClient` against a small fake connector served by Actix.

use std::collections::HashMap;
use std::time::Duration;

use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use ess_portal::error::AppError;
use ess_portal::models::LeaveType;
use ess_portal::odoo::{OdooClient, OdooConnection, OdooFile, OdooForm};
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

const API_KEY: &str = "test-key";

fn authorized(req: &HttpRequest) -> bool {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        == Some("Bearer test-key")
}

async fn leave_types(req: HttpRequest) -> HttpResponse {
    if !authorized(&req) {
        return HttpResponse::Unauthorized().json(json!({"error": "Unauthorized", "message": "Invalid API key"}));
    }
    HttpResponse::Ok().json(json!([{"id": 1, "name": "Paid Time Off"}, {"id": 2, "name": "Sick"}]))
}

async fn missing() -> HttpResponse {
    HttpResponse::NotFound().json(json!({"error": "Not Found", "message": "Employee missing"}))
}

async fn boom() -> HttpResponse {
    HttpResponse::InternalServerError().body("<html>Traceback</html>")
}

async fn not_json() -> HttpResponse {
    HttpResponse::Ok().content_type("text/html").body("<html>login</html>")
}

async fn slow() -> HttpResponse {
    actix_web::rt::time::sleep(Duration::from_secs(2)).await;
    HttpResponse::Ok().json(json!({}))
}

async fn delete_attachment() -> HttpResponse {
    HttpResponse::Ok().finish()
}

async fn search(query: web::Query<HashMap<String, String>>) -> HttpResponse {
    HttpResponse::Ok().json(query.into_inner())
}

async fn expense(req: HttpRequest, body: web::Bytes) -> HttpResponse {
    let content_type = req
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = String::from_utf8_lossy(&body);
    HttpResponse::Created().json(json!({
        "multipart": content_type.starts_with("multipart/form-data"),
        "has_employee": body.contains("name=\"employee_id\"") && body.contains("42"),
        "has_receipt": body.contains("filename=\"receipt.pdf\""),
        "message": "Expense submitted",
        "expense_id": 77,
    }))
}

async fn payslip_pdf() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header(("Content-Disposition", "attachment; filename=\"payslip_3.pdf\""))
        .body(&b"%PDF-1.4 fake"[..])
}

fn fake_odoo() -> String {
    let server = HttpServer::new(|| {
        App::new()
            .route("/ess/api/leave-types", web::get().to(leave_types))
            .route("/ess/api/missing", web::get().to(missing))
            .route("/ess/api/boom", web::get().to(boom))
            .route("/ess/api/not-json", web::get().to(not_json))
            .route("/ess/api/slow", web::get().to(slow))
            .route("/ess/api/attachment/5", web::delete().to(delete_attachment))
            .route("/ess/api/admin/employees/search", web::get().to(search))
            .route("/ess/api/expense", web::post().to(expense))
            .route("/ess/api/payslip/3/download", web::get().to(payslip_pdf))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .expect("bind fake odoo");
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    format!("http://{}/", addr)
}

fn client() -> OdooClient {
    OdooClient::new(Duration::from_millis(500)).unwrap()
}

#[actix_rt::test]
async fn test_json_get_and_auth_header() {
    let base = fake_odoo();
    let conn = OdooConnection::new(base.clone(), API_KEY);
    let types: Vec<LeaveType> = client().get(&conn, "/ess/api/leave-types").await.unwrap();
    assert_eq!(types.len(), 2);
    assert_eq!(types[0].name, "Paid Time Off");

    let wrong_key = OdooConnection::new(base, "nope");
    let err = client()
        .get::<Vec<LeaveType>>(&wrong_key, "/ess/api/leave-types")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Upstream { status: 401, ref message } if message == "Odoo API Error: Invalid API key"));
}

#[actix_rt::test]
async fn test_error_mapping() {
    let conn = OdooConnection::new(fake_odoo(), API_KEY);
    let client = client();

    let err = client.get::<Value>(&conn, "/ess/api/missing").await.unwrap_err();
    assert!(matches!(err, AppError::Upstream { status: 404, .. }));

    let err = client.get::<Value>(&conn, "/ess/api/boom").await.unwrap_err();
    assert!(matches!(err, AppError::BadGateway(_)));

    let err = client.get::<Value>(&conn, "/ess/api/not-json").await.unwrap_err();
    assert!(matches!(err, AppError::BadGateway(_)));

    let err = client.get::<Value>(&conn, "/ess/api/slow").await.unwrap_err();
    assert!(matches!(err, AppError::GatewayTimeout(_)));

    let nobody = OdooConnection::new("http://127.0.0.1:1", API_KEY);
    let err = client.get::<Value>(&nobody, "/ess/api/leave-types").await.unwrap_err();
    assert!(matches!(err, AppError::ServiceUnavailable(_)));
}

#[actix_rt::test]
async fn test_empty_body_and_query() {
    let conn = OdooConnection::new(fake_odoo(), API_KEY);
    let client = client();

    let deleted: Value = client.delete(&conn, "/ess/api/attachment/5").await.unwrap();
    assert!(deleted.is_null());

    let echoed: HashMap<String, String> = client
        .get_with_query(
            &conn,
            "/ess/api/admin/employees/search",
            &[("term", "jane doe".to_string()), ("limit", "10".to_string())],
        )
        .await
        .unwrap();
    assert_eq!(echoed.get("term").map(String::as_str), Some("jane doe"));
    assert_eq!(echoed.get("limit").map(String::as_str), Some("10"));
}

#[actix_rt::test]
async fn test_multipart_forwarding() {
    let conn = OdooConnection::new(fake_odoo(), API_KEY);
    let form = OdooForm::new()
        .text("employee_id", 42)
        .text("description", "Taxi")
        .file(OdooFile {
            field: "receipt".into(),
            filename: "receipt.pdf".into(),
            content_type: "application/pdf".into(),
            bytes: b"%PDF".to_vec(),
        });
    let echoed: Value = client()
        .request_multipart(&conn, "/ess/api/expense", form)
        .await
        .unwrap();
    assert_eq!(echoed["multipart"], true);
    assert_eq!(echoed["has_employee"], true);
    assert_eq!(echoed["has_receipt"], true);
}

#[actix_rt::test]
async fn test_download_streams_with_headers() {
    let conn = OdooConnection::new(fake_odoo(), API_KEY);
    let download = client()
        .download(&conn, "/ess/api/payslip/3/download")
        .await
        .unwrap();
    assert_eq!(download.content_type, "application/pdf");
    assert_eq!(download.content_disposition, "attachment; filename=\"payslip_3.pdf\"");
    assert_eq!(download.content_length, Some(13));

    let chunks: Vec<_> = download.body.collect().await;
    let bytes: Vec<u8> = chunks
        .into_iter()
        .flat_map(|chunk| chunk.unwrap().to_vec())
        .collect();
    assert_eq!(bytes, b"%PDF-1.4 fake");

    let missing = client().download(&conn, "/ess/api/payslip/9/download").await;
    assert!(matches!(missing, Err(AppError::Upstream { status: 404, .. })));
}
