use std::env;
use std::str::FromStr;

/// Runtime settings, read once at startup from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    pub jwt_secret: String,
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_days: i64,
    /// Base64 encoded 32-byte key used to encrypt tenant Odoo API keys.
    pub credential_encryption_key: String,
    pub frontend_url: String,
    pub cors_allowed_origins: Vec<String>,
    pub odoo_timeout_secs: u64,
    pub rate_limit_per_minute: u32,
    pub mail_webhook_url: Option<String>,
    pub mail_from: String,
    pub integration_enabled: bool,
    /// Empty means every address may call the integration API.
    pub integration_allowed_ips: Vec<String>,
    /// Reverse proxies whose `X-Forwarded-For`/`Forwarded` headers are believed.
    pub trusted_proxies: Vec<String>,
}

fn required(name: &str) -> Result<String, String> {
    env::var(name).map_err(|_| format!("{} must be set", name))
}

fn parsed_or<T: FromStr>(name: &str, default: T) -> Result<T, String> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| format!("{} must be a valid {}", name, std::any::type_name::<T>())),
        Err(_) => Ok(default),
    }
}

fn flag_or(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|raw| matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            server_port: parsed_or("SERVER_PORT", 8080)?,
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            jwt_secret: required("JWT_SECRET")?,
            access_token_expire_minutes: parsed_or("ACCESS_TOKEN_EXPIRE_MINUTES", 30)?,
            refresh_token_expire_days: parsed_or("REFRESH_TOKEN_EXPIRE_DAYS", 7)?,
            credential_encryption_key: required("CREDENTIAL_ENCRYPTION_KEY")?,
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            cors_allowed_origins: split_list(
                &env::var("CORS_ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".to_string()),
            ),
            odoo_timeout_secs: parsed_or("ODOO_TIMEOUT_SECS", 30)?,
            rate_limit_per_minute: parsed_or("RATE_LIMIT_PER_MINUTE", 100)?,
            mail_webhook_url: env::var("MAIL_WEBHOOK_URL").ok().filter(|s| !s.trim().is_empty()),
            mail_from: env::var("MAIL_FROM").unwrap_or_else(|_| "no-reply@ess.local".to_string()),
            integration_enabled: flag_or("ESS_INTEGRATION_ENABLED", true),
            integration_allowed_ips: split_list(
                &env::var("ESS_ALLOWED_IPS").unwrap_or_default(),
            ),
            trusted_proxies: split_list(&env::var("TRUSTED_PROXIES").unwrap_or_default()),
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.cors_allowed_origins
    }

    /// Link sent in password reset mails.
    pub fn password_reset_link(&self, token: &str) -> String {
        format!(
            "{}/reset-password?token={}",
            self.frontend_url.trim_end_matches('/'),
            token
        )
    }
}
