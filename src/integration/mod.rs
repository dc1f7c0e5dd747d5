//! API-key authentication for the machine-to-machine integration API.
//!
//! Callers present one of the admin-issued `api_tokens` as a bearer token.
//! Every call, accepted or not, ends up as a row in `api_logs`.

use std::rc::Rc;
use std::time::Instant;

use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{web, Error, FromRequest, HttpMessage, HttpRequest};
use futures::future::{ready, LocalBoxFuture, Ready};
use sqlx::PgPool;

use crate::config::Config;
use crate::crypto::redact;
use crate::db;
use crate::error::AppError;
use crate::models::{ApiLogEntry, ApiToken};
use crate::rate_limit::TrustedProxies;

/// Switches read from `ESS_INTEGRATION_ENABLED`, `ESS_ALLOWED_IPS` and `TRUSTED_PROXIES`.
#[derive(Debug, Clone)]
pub struct IntegrationSettings {
    pub enabled: bool,
    pub allowed_ips: Vec<String>,
    pub trusted_proxies: TrustedProxies,
}

impl IntegrationSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            enabled: config.integration_enabled,
            allowed_ips: config.integration_allowed_ips.clone(),
            trusted_proxies: TrustedProxies::new(config.trusted_proxies.clone()),
        }
    }

    pub fn ip_allowed(&self, ip: &str) -> bool {
        self.allowed_ips.is_empty() || self.allowed_ips.iter().any(|allowed| allowed == ip)
    }
}

/// The validated token of the current integration call.
#[derive(Debug, Clone)]
pub struct ApiCaller(pub ApiToken);

impl ApiCaller {
    pub fn user_id(&self) -> i32 {
        self.0.user_id
    }

    pub fn require_scope(&self, scope: &str) -> Result<(), AppError> {
        if self.0.allows(scope) {
            Ok(())
        } else {
            log::warn!(
                "Token {} lacks scope '{}' (has '{}')",
                self.0.id,
                scope,
                self.0.scope.as_deref().unwrap_or_default()
            );
            Err(AppError::Forbidden(format!("Token does not have scope for '{}'.", scope)))
        }
    }
}

impl FromRequest for ApiCaller {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<ApiCaller>().cloned() {
            Some(caller) => ready(Ok(caller)),
            None => ready(Err(AppError::Unauthorized("Missing API token.".into()).into())),
        }
    }
}

pub struct ApiKeyAuth {
    settings: IntegrationSettings,
}

impl ApiKeyAuth {
    pub fn new(settings: IntegrationSettings) -> Self {
        Self { settings }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiKeyAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = ApiKeyAuthService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiKeyAuthService {
            service: Rc::new(service),
            settings: self.settings.clone(),
        }))
    }
}

pub struct ApiKeyAuthService<S> {
    service: Rc<S>,
    settings: IntegrationSettings,
}

impl<S, B> Service<ServiceRequest> for ApiKeyAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let settings = self.settings.clone();

        Box::pin(async move {
            let started = Instant::now();
            let pool = req.app_data::<web::Data<PgPool>>().cloned();
            let mut entry = ApiLogEntry {
                endpoint: req.path().to_string(),
                method: req.method().to_string(),
                request_ip: Some(settings.trusted_proxies.client_ip(&req)),
                user_id: None,
                api_token_id: None,
                response_status_code: 500,
                message: "Processing...".into(),
                duration_ms: 0.0,
            };

            let outcome = authenticate(&req, &settings, pool.as_ref().map(|p| p.get_ref())).await;
            let result = match outcome {
                Ok(token) => {
                    entry.user_id = Some(token.user_id);
                    entry.api_token_id = Some(token.id);
                    log::info!(
                        "Integration call to {} granted for user {} via token {}",
                        entry.endpoint,
                        token.user_id,
                        token.id
                    );
                    req.extensions_mut().insert(ApiCaller(token));
                    service.call(req).await
                }
                Err(app_err) => Err(app_err.into()),
            };

            match &result {
                Ok(response) => {
                    let status = response.status();
                    entry.response_status_code = i32::from(status.as_u16());
                    entry.message = if status.is_success() {
                        "Success".to_string()
                    } else {
                        format!("Error: {}", status.canonical_reason().unwrap_or("request failed"))
                    };
                }
                Err(error) => {
                    let status = error.as_response_error().status_code();
                    entry.response_status_code = i32::from(status.as_u16());
                    entry.message = format!("Error: {}", error);
                }
            }
            entry.duration_ms = started.elapsed().as_secs_f64() * 1000.0;

            if let Some(pool) = pool {
                if let Err(e) = db::api_logs::insert(&pool, &entry).await {
                    log::error!("Failed to write API log for {}: {}", entry.endpoint, e);
                }
            }
            result
        })
    }
}

async fn authenticate(
    req: &ServiceRequest,
    settings: &IntegrationSettings,
    pool: Option<&PgPool>,
) -> Result<ApiToken, AppError> {
    if !settings.enabled {
        log::warn!("Integration call to {} denied: integration disabled", req.path());
        return Err(AppError::ServiceUnavailable("ESS API disabled.".into()));
    }

    let ip = settings.trusted_proxies.client_ip(req);
    if !settings.ip_allowed(&ip) {
        log::warn!("Integration call to {} denied: IP {} not allowed", req.path(), ip);
        return Err(AppError::Forbidden(format!("IP {} not allowed.", ip)));
    }

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Missing Bearer token.".into()))?;

    let pool = pool.ok_or_else(|| AppError::InternalServerError("Database pool not configured".into()))?;
    let api_token = db::api_tokens::find_valid(pool, token).await?.ok_or_else(|| {
        log::warn!("Invalid or inactive API token: {}", redact(token));
        AppError::Unauthorized("Invalid or inactive API token.".into())
    })?;

    if let Err(e) = db::api_tokens::touch_last_used(pool, api_token.id).await {
        log::error!("Failed to update last_used of token {}: {}", api_token.id, e);
    }
    Ok(api_token)
}
