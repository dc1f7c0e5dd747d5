use std::io;
use std::time::Duration;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;

use ess_portal::auth::{AuthMiddleware, TokenService};
use ess_portal::config::Config;
use ess_portal::crypto::CredentialCipher;
use ess_portal::integration::{ApiKeyAuth, IntegrationSettings};
use ess_portal::mailer;
use ess_portal::odoo::OdooClient;
use ess_portal::rate_limit::{RateLimit, RateLimiter, TrustedProxies};
use ess_portal::routes::{self, health};

fn startup_error(message: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::Other, message.into())
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env().map_err(startup_error)?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(|e| startup_error(format!("Failed to connect to database: {}", e)))?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| startup_error(format!("Failed to run migrations: {}", e)))?;

    let cipher = CredentialCipher::from_base64_key(&config.credential_encryption_key).map_err(startup_error)?;
    let tokens = web::Data::new(TokenService::from_config(&config));
    let odoo_client = OdooClient::new(Duration::from_secs(config.odoo_timeout_secs))
        .map_err(|e| startup_error(e.to_string()))?;
    let mailer = web::Data::from(mailer::from_config(&config));
    let integration = IntegrationSettings::from_config(&config);
    let limiter = RateLimiter::per_minute(config.rate_limit_per_minute);
    let proxies = TrustedProxies::new(config.trusted_proxies.clone());

    let cleanup = limiter.clone();
    actix_web::rt::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            cleanup.cleanup().await;
        }
    });

    let pool = web::Data::new(pool);
    let cipher = web::Data::new(cipher);
    let odoo_client = web::Data::new(odoo_client);
    let bind_address = (config.server_host.clone(), config.server_port);
    log::info!("Starting ESS Portal backend at {}", config.server_url());
    let config = web::Data::new(config);

    HttpServer::new(move || {
        let cors = config
            .cors_origins()
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(pool.clone())
            .app_data(cipher.clone())
            .app_data(tokens.clone())
            .app_data(odoo_client.clone())
            .app_data(mailer.clone())
            .app_data(config.clone())
            .wrap(RateLimit::new(limiter.clone(), proxies.clone()))
            .wrap(cors)
            .wrap(Logger::default())
            .service(health::health)
            .service(health::root)
            .service(
                web::scope("/api/v1")
                    .wrap(AuthMiddleware)
                    .service(
                        web::scope("/integration")
                            .wrap(ApiKeyAuth::new(integration.clone()))
                            .configure(routes::integration::config),
                    )
                    .configure(routes::config),
            )
    })
    .bind(bind_address)?
    .run()
    .await
}
