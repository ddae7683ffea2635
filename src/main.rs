//! Contacts Service Server
//!
//! Loads configuration from the environment, applies migrations and serves
//! every API route, plus locally stored avatars when that backend is used.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use dotenv::dotenv;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use contacts_service::{
    api::{AppState, RouterBuilder},
    config::{AppConfig, AvatarBackend},
    database::run_migrations,
    repository::{PgContactRepository, PgUserRepository},
    service::{storage_from_config, LogMailer, Mailer, SmtpMailer},
};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                log::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(origins)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file if present
    dotenv().ok();

    env_logger::init();

    log::info!("Starting Contacts Service v{}", contacts_service::VERSION);

    // Load configuration from environment
    let config = AppConfig::from_env()?;
    config.validate()?;

    log::info!("Configuration loaded and validated");

    let database_pool = config.database.create_pool().await?;

    log::info!("Running database migrations...");
    run_migrations(&database_pool).await?;
    log::info!("Database migrations completed");

    let mailer: Arc<dyn Mailer> = match &config.email {
        Some(email_config) => {
            let mailer = SmtpMailer::new(email_config)?;
            if let Err(e) = mailer.test_connection().await {
                log::warn!("SMTP server not reachable at startup: {}", e);
            }
            log::info!("Email delivery via SMTP {}", email_config.smtp_host);
            Arc::new(mailer)
        }
        None => {
            log::warn!("SMTP_HOST not set; emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    let avatar_storage = storage_from_config(&config.avatar, &config.server.base_url);

    let app_state = AppState::from_config(
        &config,
        Arc::new(PgUserRepository::new(database_pool.clone())),
        Arc::new(PgContactRepository::new(database_pool)),
        mailer,
        avatar_storage,
    )?;

    let mut builder = RouterBuilder::with_all_routes();
    match &config.avatar.backend {
        AvatarBackend::Local { dir } => {
            tokio::fs::create_dir_all(dir).await?;
            log::info!("Avatars stored in {}", dir.display());
            builder = builder.local_avatars(dir.clone());
        }
        AvatarBackend::Cloudinary { cloud_name, .. } => {
            log::info!("Avatars stored on Cloudinary cloud {}", cloud_name);
        }
    }

    let app = builder
        .build(&app_state)
        .with_state(app_state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.server.cors_origins))
                .into_inner(),
        );

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    log::info!("Listening on {} (public URL {})", bind_addr, config.server.base_url);

    // Peer addresses feed the per-client rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
}
