use std::time::Duration;

use actix_web::web::Bytes;
use futures::stream::{BoxStream, StreamExt};
use reqwest::{multipart, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::AppError;

/// Where a tenant's connector lives and the key it accepts.
#[derive(Clone)]
pub struct OdooConnection {
    pub base_url: String,
    pub api_key: String,
}

impl OdooConnection {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), endpoint)
    }
}

impl std::fmt::Debug for OdooConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OdooConnection")
            .field("base_url", &self.base_url)
            .field("api_key", &crate::crypto::redact(&self.api_key))
            .finish()
    }
}

/// A file part of a multipart request.
#[derive(Debug, Clone)]
pub struct OdooFile {
    pub field: String,
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A multipart/form-data body for the connector.
#[derive(Debug, Default, Clone)]
pub struct OdooForm {
    fields: Vec<(String, String)>,
    files: Vec<OdooFile>,
}

impl OdooForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: impl ToString) -> Self {
        self.fields.push((name.to_string(), value.to_string()));
        self
    }

    pub fn file(mut self, file: OdooFile) -> Self {
        self.files.push(file);
        self
    }

    fn into_multipart(self) -> Result<multipart::Form, AppError> {
        let mut form = multipart::Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        for file in self.files {
            let part = multipart::Part::bytes(file.bytes)
                .file_name(file.filename)
                .mime_str(&file.content_type)
                .map_err(|_| AppError::BadRequest("Invalid file content type".into()))?;
            form = form.part(file.field, part);
        }
        Ok(form)
    }
}

/// A file coming back from Odoo, not yet read into memory.
pub struct OdooDownload {
    pub content_type: String,
    pub content_disposition: String,
    pub content_length: Option<u64>,
    pub body: BoxStream<'static, Result<Bytes, reqwest::Error>>,
}

/// Shared reqwest client used for every tenant.
#[derive(Clone)]
pub struct OdooClient {
    http: reqwest::Client,
}

impl OdooClient {
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalServerError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { http })
    }

    fn request(&self, conn: &OdooConnection, method: Method, endpoint: &str) -> RequestBuilder {
        self.http
            .request(method, conn.url(endpoint))
            .bearer_auth(&conn.api_key)
    }

    /// JSON call; `payload` becomes the request body when present.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        conn: &OdooConnection,
        method: Method,
        endpoint: &str,
        payload: Option<&Value>,
    ) -> Result<T, AppError> {
        log::info!("Calling Odoo API: {} {}", method, conn.url(endpoint));
        let mut builder = self
            .request(conn, method, endpoint)
            .header("Accept", "application/json");
        if let Some(payload) = payload {
            builder = builder.json(payload);
        }
        execute(builder).await
    }

    pub async fn get<T: DeserializeOwned>(&self, conn: &OdooConnection, endpoint: &str) -> Result<T, AppError> {
        self.request_json(conn, Method::GET, endpoint, None).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        conn: &OdooConnection,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, AppError> {
        log::info!("Calling Odoo API: GET {}", conn.url(endpoint));
        let builder = self
            .request(conn, Method::GET, endpoint)
            .header("Accept", "application/json")
            .query(query);
        execute(builder).await
    }

    pub async fn post<T: DeserializeOwned, P: Serialize>(
        &self,
        conn: &OdooConnection,
        endpoint: &str,
        payload: &P,
    ) -> Result<T, AppError> {
        let payload = serde_json::to_value(payload)
            .map_err(|e| AppError::InternalServerError(format!("Failed to encode payload: {}", e)))?;
        self.request_json(conn, Method::POST, endpoint, Some(&payload)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, conn: &OdooConnection, endpoint: &str) -> Result<T, AppError> {
        self.request_json(conn, Method::DELETE, endpoint, None).await
    }

    /// multipart/form-data POST, e.g. expense receipts and documents.
    pub async fn request_multipart<T: DeserializeOwned>(
        &self,
        conn: &OdooConnection,
        endpoint: &str,
        form: OdooForm,
    ) -> Result<T, AppError> {
        log::info!("Calling Odoo API (multipart): POST {}", conn.url(endpoint));
        let builder = self
            .request(conn, Method::POST, endpoint)
            .multipart(form.into_multipart()?);
        execute(builder).await
    }

    /// Starts a GET and hands back the body as a stream with the headers to forward.
    pub async fn download(&self, conn: &OdooConnection, endpoint: &str) -> Result<OdooDownload, AppError> {
        log::info!("Downloading from Odoo: GET {}", conn.url(endpoint));
        let response = self
            .request(conn, Method::GET, endpoint)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type = header("content-type").unwrap_or_else(|| "application/octet-stream".into());
        let content_disposition = header("content-disposition").unwrap_or_else(|| "attachment".into());
        let content_length = response.content_length();

        Ok(OdooDownload {
            content_type,
            content_disposition,
            content_length,
            body: response.bytes_stream().boxed(),
        })
    }
}

async fn execute<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, AppError> {
    let response = builder.send().await.map_err(transport_error)?;
    let status = response.status();
    let body = response.bytes().await.map_err(transport_error)?;
    log::info!("Odoo API response status: {}", status);

    if !status.is_success() {
        return Err(status_error(status, &body));
    }
    decode_body(&body)
}

/// An empty body decodes as JSON `null`.
fn decode_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    let result = if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_value(Value::Null)
    } else {
        serde_json::from_slice(body)
    };
    result.map_err(|e| {
        log::error!("Undecodable Odoo response: {}", e);
        AppError::BadGateway("Invalid response received from Odoo.".into())
    })
}

fn transport_error(error: reqwest::Error) -> AppError {
    if error.is_timeout() {
        log::error!("Odoo API call timed out: {}", error);
        AppError::GatewayTimeout("Request to Odoo timed out.".into())
    } else {
        log::error!("Odoo API request error: {}", error);
        AppError::ServiceUnavailable(format!("Could not connect to Odoo service: {}", error))
    }
}

/// Client errors keep their status; anything else surfaces as 502.
fn status_error(status: StatusCode, body: &[u8]) -> AppError {
    let detail = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| "Error communicating with Odoo.".to_string());
    log::error!(
        "Odoo API returned error status {}: {}",
        status,
        String::from_utf8_lossy(&body[..body.len().min(200)])
    );

    let message = format!("Odoo API Error: {}", detail);
    if status.is_client_error() {
        AppError::Upstream {
            status: status.as_u16(),
            message,
        }
    } else {
        AppError::BadGateway(message)
    }
}
