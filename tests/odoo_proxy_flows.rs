//! Employee and admin flows through the full app against a real Postgres and
//! a fake Odoo connector. Run with `DATABASE_URL=... cargo test -- --ignored`.

use actix_web::http::StatusCode;
use actix_web::{test, web, App, HttpRequest, HttpResponse, HttpServer};
use chrono::Duration;
use dotenv::dotenv;
use ess_portal::auth::{hash_password, AuthMiddleware, TokenService};
use ess_portal::crypto::CredentialCipher;
use ess_portal::db::{self, users::NewUser};
use ess_portal::integration::{ApiKeyAuth, IntegrationSettings};
use ess_portal::odoo::OdooClient;
use ess_portal::rate_limit::TrustedProxies;
use ess_portal::routes::{self, health};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

const TENANT_KEY: &str = "tenant-key";
const HEALTHY: i32 = 42;
/// Odoo answers 404 for this employee, and 500 for their documents.
const MISSING: i32 = 99;
/// Odoo rejects the key when asked about this employee.
const REJECTED: i32 = 7;

// Fake connector

fn refused(req: &HttpRequest, employee_id: i32) -> Option<HttpResponse> {
    let key_ok = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        == Some("Bearer tenant-key");
    if !key_ok || employee_id == REJECTED {
        return Some(HttpResponse::Unauthorized().json(json!({"error": "Unauthorized", "message": "Invalid API key"})));
    }
    if employee_id == MISSING {
        return Some(HttpResponse::NotFound().json(json!({"error": "Not Found", "message": "Employee missing"})));
    }
    None
}

async fn employee(req: HttpRequest, path: web::Path<i32>) -> HttpResponse {
    let id = path.into_inner();
    refused(&req, id).unwrap_or_else(|| {
        HttpResponse::Ok().json(json!({
            "id": id, "name": "Jane Odoo", "job_title": "Engineer", "work_phone": "555-0100",
            "mobile_phone": null, "address": "1 Main St", "department": "R&D"
        }))
    })
}

async fn documents(req: HttpRequest, path: web::Path<i32>) -> HttpResponse {
    let id = path.into_inner();
    if id == MISSING {
        return HttpResponse::InternalServerError().body("<html>Traceback</html>");
    }
    refused(&req, id).unwrap_or_else(|| {
        HttpResponse::Ok().json(json!([{
            "id": 5, "filename": "cv.pdf", "document_type": "CV",
            "upload_date": "2024-05-01 08:00:00", "mimetype": "application/pdf", "size": 10
        }]))
    })
}

async fn upload(req: HttpRequest, path: web::Path<i32>, body: web::Bytes) -> HttpResponse {
    let id = path.into_inner();
    let body = String::from_utf8_lossy(&body);
    refused(&req, id).unwrap_or_else(|| {
        HttpResponse::Ok().json(json!({
            "message": "Document uploaded",
            "attachment_id": 11,
            "filename": if body.contains("filename=\"id.pdf\"") { "id.pdf" } else { "?" },
            "document_type": "ID",
            "employee_id": id,
        }))
    })
}

async fn pending_count(req: HttpRequest, path: web::Path<i32>) -> HttpResponse {
    let id = path.into_inner();
    refused(&req, id).unwrap_or_else(|| HttpResponse::Ok().json(json!({"employee_id": id, "pending_leave_count": 2})))
}

async fn next_off(req: HttpRequest, path: web::Path<i32>) -> HttpResponse {
    let id = path.into_inner();
    refused(&req, id).unwrap_or_else(|| {
        HttpResponse::Ok().json(json!({"employee_id": id, "next_day_off": null, "leave_name": null}))
    })
}

async fn attendance_status(req: HttpRequest, path: web::Path<i32>) -> HttpResponse {
    let id = path.into_inner();
    refused(&req, id).unwrap_or_else(|| {
        HttpResponse::Ok().json(json!({
            "status": "checked_in", "last_action_time": "2024-05-01 08:00:00", "message": "Currently checked in"
        }))
    })
}

async fn attendance_today(req: HttpRequest, path: web::Path<i32>) -> HttpResponse {
    let id = path.into_inner();
    refused(&req, id).unwrap_or_else(|| {
        HttpResponse::Ok().json(json!([{"id": 1, "check_in": "08:00:00", "check_out": null, "worked_hours": null}]))
    })
}

async fn file_download(req: HttpRequest) -> HttpResponse {
    refused(&req, 0).unwrap_or_else(|| {
        HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header(("Content-Disposition", "attachment; filename=\"file.pdf\""))
            .body(&b"%PDF-1.4 fake"[..])
    })
}

async fn auth_test(req: HttpRequest) -> HttpResponse {
    refused(&req, 0).unwrap_or_else(|| {
        HttpResponse::Ok().json(json!({"status": "success", "authenticated_user_login": "odoo-admin"}))
    })
}

fn fake_connector() -> String {
    let server = HttpServer::new(|| {
        App::new()
            .route("/ess/api/auth-test", web::get().to(auth_test))
            .route("/ess/api/employee/{id}", web::get().to(employee))
            .route("/ess/api/employee/{id}/documents", web::get().to(documents))
            .route("/ess/api/employee/{id}/document", web::post().to(upload))
            .route("/ess/api/leaves/pending-count/{id}", web::get().to(pending_count))
            .route("/ess/api/leaves/next-off/{id}", web::get().to(next_off))
            .route("/ess/api/attendance/status/{id}", web::get().to(attendance_status))
            .route("/ess/api/attendance/today/{id}", web::get().to(attendance_today))
            .route("/ess/api/payslip/{id}/download", web::get().to(file_download))
            .route("/ess/api/attachment/{id}/download", web::get().to(file_download))
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .expect("bind fake connector");
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    format!("http://{}", addr)
}

// Fixtures

struct Seeded {
    tenant_id: i32,
    admin: String,
    healthy: String,
    missing: String,
    rejected: String,
    unlinked: String,
    unconfigured: String,
    unlinked_id: i32,
    admin_id: i32,
}

fn tokens() -> TokenService {
    TokenService::new("flows-secret", Duration::minutes(30), Duration::days(7))
}

fn cipher() -> CredentialCipher {
    CredentialCipher::new([9u8; 32])
}

async fn connect() -> PgPool {
    dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let pool = PgPool::connect(&database_url).await.expect("Failed to connect to test DB");
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

async fn add_user(pool: &PgPool, tenant_id: i32, email: &str, is_admin: bool, employee: Option<i32>) -> (i32, String) {
    let hashed = hash_password("Password123!").unwrap();
    let user = db::users::create(
        pool,
        &NewUser {
            email,
            hashed_password: &hashed,
            full_name: Some("SaaS Name"),
            tenant_id,
            is_admin,
            is_active: true,
            odoo_employee_id: employee,
            job_title: Some("SaaS Title"),
            phone: None,
        },
    )
    .await
    .unwrap();
    let access = tokens().issue_access(user.id, &user.email, is_admin).unwrap();
    (user.id, access)
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

macro_rules! flow_app {
    ($pool:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($pool))
                .app_data(web::Data::new(tokens()))
                .app_data(web::Data::new(cipher()))
                .app_data(web::Data::new(OdooClient::new(std::time::Duration::from_secs(2)).unwrap()))
                .service(health::health)
                .service(
                    web::scope("/api/v1")
                        .wrap(AuthMiddleware)
                        .service(
                            web::scope("/integration")
                                .wrap(ApiKeyAuth::new(IntegrationSettings {
                                    enabled: true,
                                    allowed_ips: vec![],
                                    trusted_proxies: TrustedProxies::default(),
                                }))
                                .configure(routes::integration::config),
                        )
                        .configure(routes::config),
                ),
        )
        .await
    };
}
macro_rules! get_json {
    ($app:expr, $uri:expr, $token:expr) => {{
        let req = test::TestRequest::get()
            .uri($uri)
            .insert_header(bearer($token))
            .to_request();
        let resp = test::call_service(&$app, req).await;
        let status = resp.status();
        let body: Value = test::read_body_json(resp).await;
        (status, body)
    }};
}

/// Status of an integration call; middleware rejections surface as errors.
macro_rules! integration_status {
    ($app:expr, $uri:expr, $key:expr) => {{
        let req = test::TestRequest::get()
            .uri($uri)
            .insert_header(bearer($key))
            .to_request();
        match test::try_call_service(&$app, req).await {
            Ok(resp) => resp.status(),
            Err(e) => e.as_response_error().status_code(),
        }
    }};
}

/// One tenant wired to the fake connector through the admin API, and one without Odoo.
async fn seed(pool: &PgPool, base_url: &str) -> Seeded {
    let run = Uuid::new_v4().simple().to_string();
    let tenant_id = db::tenants::create(pool, &format!("Flows {}", run), true).await.unwrap().id;
    let bare_tenant = db::tenants::create(pool, &format!("Flows bare {}", run), true).await.unwrap().id;
    let email = |who: &str| format!("{}-{}@flows.test", who, run);

    let (admin_id, admin) = add_user(pool, tenant_id, &email("admin"), true, None).await;
    let (_, healthy) = add_user(pool, tenant_id, &email("healthy"), false, Some(HEALTHY)).await;
    let (_, missing) = add_user(pool, tenant_id, &email("missing"), false, Some(MISSING)).await;
    let (_, rejected) = add_user(pool, tenant_id, &email("rejected"), false, Some(REJECTED)).await;
    let (unlinked_id, unlinked) = add_user(pool, tenant_id, &email("unlinked"), false, None).await;
    let (_, unconfigured) = add_user(pool, bare_tenant, &email("bare"), false, Some(HEALTHY)).await;

    let app = flow_app!(pool.clone());
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/admin/tenant/{}/odoo-config", tenant_id))
        .insert_header(bearer(&admin))
        .set_json(json!({
            "odoo_base_url": base_url,
            "odoo_db_name": "odoo",
            "odoo_username": "odoo-admin",
            "odoo_api_key": TENANT_KEY,
        }))
        .to_request();
    let shown: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(shown["odoo_base_url"], base_url);
    assert!(shown.get("odoo_api_key").is_none());

    let stored = db::odoo_credentials::find_by_tenant(pool, tenant_id).await.unwrap().unwrap();
    assert_ne!(stored.encrypted_odoo_api_key, TENANT_KEY);

    Seeded {
        tenant_id,
        admin,
        healthy,
        missing,
        rejected,
        unlinked,
        unconfigured,
        unlinked_id,
        admin_id,
    }
}

// Flows

#[actix_rt::test]
#[ignore = "needs a Postgres database in DATABASE_URL"]
async fn test_dashboard_widgets_degrade() {
    let pool = connect().await;
    let seeded = seed(&pool, &fake_connector()).await;
    let app = flow_app!(pool.clone());

    let (status, body) = get_json!(app, "/api/v1/dashboard/pending-leaves-count", &seeded.healthy);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"employee_id": HEALTHY, "pending_leave_count": 2}));

    let (_, body) = get_json!(app, "/api/v1/dashboard/next-day-off", &seeded.healthy);
    assert_eq!(body["employee_id"], HEALTHY);
    assert_eq!(body["message"], "No upcoming approved leave found.");

    // Odoo 404
    let (status, body) = get_json!(app, "/api/v1/dashboard/pending-leaves-count", &seeded.missing);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"employee_id": MISSING, "pending_leave_count": 0}));

    let (status, body) = get_json!(app, "/api/v1/dashboard/next-day-off", &seeded.missing);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["employee_id"], MISSING);
    assert_eq!(body["message"], "Could not retrieve leave information.");

    // Tenant without Odoo configuration: 503 internally, placeholder outside.
    let (status, body) = get_json!(app, "/api/v1/dashboard/pending-leaves-count", &seeded.unconfigured);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pending_leave_count"], 0);

    // Not linked: 400 internally, still a placeholder.
    let (status, body) = get_json!(app, "/api/v1/dashboard/next-day-off", &seeded.unlinked);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["employee_id"], 0);

    // A rejected key is not absorbed.
    let (status, _) = get_json!(app, "/api/v1/dashboard/pending-leaves-count", &seeded.rejected);
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
#[ignore = "needs a Postgres database in DATABASE_URL"]
async fn test_attendance_fallbacks() {
    let pool = connect().await;
    let seeded = seed(&pool, &fake_connector()).await;
    let app = flow_app!(pool.clone());

    let (_, body) = get_json!(app, "/api/v1/attendance/status", &seeded.healthy);
    assert_eq!(body["status"], "checked_in");
    assert_eq!(body["last_action_time"], "2024-05-01 08:00:00");

    let (status, body) = get_json!(app, "/api/v1/attendance/status", &seeded.missing);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "Could not retrieve status from HR system.");

    let (_, body) = get_json!(app, "/api/v1/attendance/status", &seeded.unconfigured);
    assert_eq!(body["status"], "error");

    let (_, body) = get_json!(app, "/api/v1/attendance/status", &seeded.unlinked);
    assert_eq!(body["status"], "unknown");
    assert_eq!(body["message"], "Not linked to HR system.");

    let (_, body) = get_json!(app, "/api/v1/attendance/today-log", &seeded.healthy);
    assert_eq!(body["employee_id"], HEALTHY);
    assert_eq!(body["attendance_log"][0]["check_in"], "08:00:00");
    assert!(body["message"].is_null());

    let (status, body) = get_json!(app, "/api/v1/attendance/today-log", &seeded.missing);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"employee_id": MISSING, "attendance_log": [], "message": "Could not retrieve attendance log."})
    );

    let (_, body) = get_json!(app, "/api/v1/attendance/today-log", &seeded.unlinked);
    assert_eq!(
        body,
        json!({"employee_id": null, "attendance_log": [], "message": "Not linked to HR system."})
    );
}

#[actix_rt::test]
#[ignore = "needs a Postgres database in DATABASE_URL"]
async fn test_profile_overlay_and_fallback() {
    let pool = connect().await;
    let seeded = seed(&pool, &fake_connector()).await;
    let app = flow_app!(pool.clone());

    let (_, body) = get_json!(app, "/api/v1/users/me", &seeded.healthy);
    assert_eq!(body["full_name"], "Jane Odoo");
    assert_eq!(body["phone"], "555-0100");
    assert_eq!(body["department"], "R&D");

    for token in [&seeded.missing, &seeded.rejected, &seeded.unconfigured, &seeded.unlinked] {
        let (status, body) = get_json!(app, "/api/v1/users/me", token);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["full_name"], "SaaS Name");
        assert_eq!(body["job_title"], "SaaS Title");
        assert!(body["department"].is_null());
    }
}

#[actix_rt::test]
#[ignore = "needs a Postgres database in DATABASE_URL"]
async fn test_documents_and_downloads() {
    let pool = connect().await;
    let seeded = seed(&pool, &fake_connector()).await;
    let app = flow_app!(pool.clone());

    let (_, body) = get_json!(app, "/api/v1/documents", &seeded.healthy);
    assert_eq!(body[0]["filename"], "cv.pdf");

    // Odoo 500 and unlinked accounts both list nothing.
    let (status, body) = get_json!(app, "/api/v1/documents", &seeded.missing);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
    let (_, body) = get_json!(app, "/api/v1/documents", &seeded.unlinked);
    assert_eq!(body, json!([]));
    let (_, body) = get_json!(app, "/api/v1/documents", &seeded.unconfigured);
    assert_eq!(body, json!([]));

    let (status, _) = get_json!(app, "/api/v1/documents", &seeded.rejected);
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let boundary = "essflowboundary";
    let form = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"document_type\"\r\n\r\nID\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"id.pdf\"\r\n\
         Content-Type: application/pdf\r\n\r\n%PDF-1.4 fake\r\n--{b}--\r\n",
        b = boundary
    );
    let req = test::TestRequest::post()
        .uri("/api/v1/documents")
        .insert_header(bearer(&seeded.healthy))
        .insert_header(("Content-Type", format!("multipart/form-data; boundary={}", boundary)))
        .set_payload(form)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body,
        json!({
            "message": "Document uploaded",
            "document": {"attachment_id": 11, "filename": "id.pdf", "document_type": "ID", "employee_id": HEALTHY}
        })
    );

    // Downloads only need the tenant connection, not an employee link.
    for uri in ["/api/v1/payslip/3/download", "/api/v1/document/5/download"] {
        let req = test::TestRequest::get()
            .uri(uri)
            .insert_header(bearer(&seeded.unlinked))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
        assert_eq!(resp.headers().get("content-type").unwrap(), "application/pdf");
        assert_eq!(&test::read_body(resp).await[..], b"%PDF-1.4 fake");
    }
}

#[actix_rt::test]
#[ignore = "needs a Postgres database in DATABASE_URL"]
async fn test_admin_tenant_and_user_rules() {
    let pool = connect().await;
    let seeded = seed(&pool, &fake_connector()).await;
    let app = flow_app!(pool.clone());
    let admin = &seeded.admin;

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/admin/tenant/{}/test-odoo-connection", seeded.tenant_id))
        .insert_header(bearer(admin))
        .to_request();
    let outcome: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(outcome["status"], "success");
    assert_eq!(outcome["odoo_user_login"], "odoo-admin");

    // Duplicate tenant name
    let tenant: Value = get_json!(app, &format!("/api/v1/admin/tenant/{}", seeded.tenant_id), admin).1;
    let req = test::TestRequest::post()
        .uri("/api/v1/admin/tenants")
        .insert_header(bearer(admin))
        .set_json(json!({"name": tenant["name"]}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    // A tenant with users cannot be deleted until they are gone.
    let name = format!("Doomed {}", Uuid::new_v4().simple());
    let req = test::TestRequest::post()
        .uri("/api/v1/admin/tenants")
        .insert_header(bearer(admin))
        .set_json(json!({"name": name}))
        .to_request();
    let doomed: Value = test::call_and_read_body_json(&app, req).await;
    let doomed_id = doomed["id"].as_i64().unwrap();

    let email = format!("member-{}@flows.test", Uuid::new_v4().simple());
    let req = test::TestRequest::post()
        .uri("/api/v1/admin/users")
        .insert_header(bearer(admin))
        .set_json(json!({
            "email": email, "password": "Password123!", "tenant_id": doomed_id,
            "full_name": "Member", "job_title": "Clerk", "phone": "555-0111", "odoo_employee_id": 5
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let member: Value = test::read_body_json(resp).await;
    let member_id = member["id"].as_i64().unwrap();

    // Duplicate email, case-insensitively.
    let req = test::TestRequest::post()
        .uri("/api/v1/admin/users")
        .insert_header(bearer(admin))
        .set_json(json!({"email": email.to_uppercase(), "password": "Password123!", "tenant_id": doomed_id}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Email already registered by another SaaS user.");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/admin/tenant/{}", doomed_id))
        .insert_header(bearer(admin))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    // Explicit null clears, absent fields stay.
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/admin/user/{}", member_id))
        .insert_header(bearer(admin))
        .set_json(json!({"job_title": null, "odoo_employee_id": null}))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert!(updated["job_title"].is_null());
    assert!(updated["odoo_employee_id"].is_null());
    assert_eq!(updated["full_name"], "Member");
    assert_eq!(updated["phone"], "555-0111");

    // Taking another user's email on update is refused too.
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/admin/user/{}", seeded.unlinked_id))
        .insert_header(bearer(admin))
        .set_json(json!({"email": email}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/admin/user/{}", member_id))
        .insert_header(bearer(admin))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/admin/tenant/{}", doomed_id))
        .insert_header(bearer(admin))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let (status, _) = get_json!(app, &format!("/api/v1/admin/tenant/{}", doomed_id), admin);
    assert_eq!(status, StatusCode::NOT_FOUND);

    // The calling admin is untouched by all of this.
    assert!(db::users::find_by_id(&pool, seeded.admin_id).await.unwrap().unwrap().is_admin);
}

#[actix_rt::test]
#[ignore = "needs a Postgres database in DATABASE_URL"]
async fn test_integration_token_lifecycle() {
    let pool = connect().await;
    let seeded = seed(&pool, &fake_connector()).await;
    let app = flow_app!(pool.clone());
    let admin = &seeded.admin;

    let issue = |scope: &str| {
        test::TestRequest::post()
            .uri("/api/v1/admin/api-tokens")
            .insert_header(bearer(admin))
            .set_json(json!({"name": "payroll sync", "user_id": seeded.unlinked_id, "scope": scope}))
            .to_request()
    };
    let resp = test::call_service(&app, issue("profile")).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created: Value = test::read_body_json(resp).await;
    let token_id = created["id"].as_i64().unwrap();
    let key = created["token"].as_str().unwrap().to_string();

    let narrow: Value = test::call_and_read_body_json(&app, issue("leave")).await;
    let narrow_key = narrow["token"].as_str().unwrap().to_string();

    // The admin list never shows the full secret.
    let (_, listed) = get_json!(app, "/api/v1/admin/api-tokens", admin);
    let shown = listed
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["id"] == created["id"])
        .unwrap();
    assert_ne!(shown["token"], created["token"]);

    let req = test::TestRequest::get()
        .uri("/api/v1/integration/profile")
        .insert_header(bearer(&key))
        .to_request();
    let profile: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(profile["full_name"], "SaaS Name");
    assert!(profile["email"].as_str().unwrap().starts_with("unlinked-"));

    assert_eq!(
        integration_status!(app, "/api/v1/integration/profile", &narrow_key),
        StatusCode::FORBIDDEN
    );
    assert_eq!(
        integration_status!(app, "/api/v1/integration/auth-test", &narrow_key),
        StatusCode::OK
    );

    // Toggle off, then on again.
    let toggle = || {
        test::TestRequest::post()
            .uri(&format!("/api/v1/admin/api-token/{}/toggle", token_id))
            .insert_header(bearer(admin))
            .to_request()
    };
    let off: Value = test::call_and_read_body_json(&app, toggle()).await;
    assert_eq!(off["active"], false);
    assert_eq!(
        integration_status!(app, "/api/v1/integration/profile", &key),
        StatusCode::UNAUTHORIZED
    );
    let on: Value = test::call_and_read_body_json(&app, toggle()).await;
    assert_eq!(on["active"], true);
    assert_eq!(integration_status!(app, "/api/v1/integration/profile", &key), StatusCode::OK);

    // Regenerating retires the old secret at once.
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/admin/api-token/{}/regenerate", token_id))
        .insert_header(bearer(admin))
        .to_request();
    let regenerated: Value = test::call_and_read_body_json(&app, req).await;
    let new_key = regenerated["token"].as_str().unwrap().to_string();
    assert_ne!(new_key, key);
    assert_eq!(
        integration_status!(app, "/api/v1/integration/profile", &key),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(integration_status!(app, "/api/v1/integration/profile", &new_key), StatusCode::OK);

    let delete = || {
        test::TestRequest::delete()
            .uri(&format!("/api/v1/admin/api-token/{}", token_id))
            .insert_header(bearer(admin))
            .to_request()
    };
    assert_eq!(test::call_service(&app, delete()).await.status(), StatusCode::NO_CONTENT);
    assert_eq!(test::call_service(&app, delete()).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        integration_status!(app, "/api/v1/integration/profile", &new_key),
        StatusCode::UNAUTHORIZED
    );
}
