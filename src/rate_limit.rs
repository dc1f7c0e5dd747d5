//! Fixed-window request budget per client IP, applied to the whole app.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::AppError;

struct IpEntry {
    count: u32,
    window_start: Instant,
}

/// Counters shared by every worker; clone it into each `App`.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<HashMap<String, IpEntry>>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    /// Returns `true` if the request is allowed, `false` if rate-limited.
    pub async fn check(&self, ip: &str) -> bool {
        let mut map = self.inner.lock().await;
        let now = Instant::now();
        let entry = map.entry(ip.to_owned()).or_insert_with(|| IpEntry {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count += 1;
        entry.count <= self.max_requests
    }

    /// Forgets clients whose window ended more than one window ago.
    pub async fn cleanup(&self) {
        let mut map = self.inner.lock().await;
        let now = Instant::now();
        let horizon = self.window * 2;
        map.retain(|_, entry| now.duration_since(entry.window_start) < horizon);
    }

    pub async fn tracked_clients(&self) -> usize {
        self.inner.lock().await.len()
    }
}

/// Reverse proxies allowed to report the client address.
///
/// Requests from any other peer are keyed on the socket address, whatever
/// forwarding headers they carry.
#[derive(Debug, Clone, Default)]
pub struct TrustedProxies(Vec<String>);

impl TrustedProxies {
    pub fn new(addresses: Vec<String>) -> Self {
        Self(addresses)
    }

    pub fn client_ip(&self, req: &ServiceRequest) -> String {
        let peer = match req.peer_addr() {
            Some(addr) => addr.ip().to_string(),
            None => return "unknown".to_string(),
        };
        if !self.0.iter().any(|proxy| *proxy == peer) {
            return peer;
        }
        req.connection_info()
            .realip_remote_addr()
            .and_then(|addr| addr.split(',').next())
            .map(|addr| addr.trim().to_string())
            .filter(|addr| !addr.is_empty())
            .unwrap_or(peer)
    }
}

pub struct RateLimit {
    limiter: RateLimiter,
    proxies: TrustedProxies,
}

impl RateLimit {
    pub fn new(limiter: RateLimiter, proxies: TrustedProxies) -> Self {
        Self { limiter, proxies }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RateLimitService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitService {
            service: Rc::new(service),
            limiter: self.limiter.clone(),
            proxies: self.proxies.clone(),
        }))
    }
}

pub struct RateLimitService<S> {
    service: Rc<S>,
    limiter: RateLimiter,
    proxies: TrustedProxies,
}

impl<S, B> Service<ServiceRequest> for RateLimitService<S>
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
        let limiter = self.limiter.clone();
        let ip = self.proxies.client_ip(&req);

        Box::pin(async move {
            if !limiter.check(&ip).await {
                log::warn!("Rate limit exceeded for {} on {}", ip, req.path());
                let err = AppError::TooManyRequests("Too many requests, try again later".into());
                return Err(err.into());
            }
            service.call(req).await
        })
    }
}
