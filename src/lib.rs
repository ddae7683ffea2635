//! Contacts Service Library
//!
//! A REST service where users register, confirm their email, log in with a
//! bearer token and manage their own address book.
//!
//! # Features
//!
//! - **Accounts**: registration with email confirmation, login, password reset by email link
//! - **Contacts**: per-user CRUD, substring filters, paging and upcoming birthdays
//! - **Avatars**: uploads stored on Cloudinary or a local directory (admin only)
//! - **Flexible Router**: route groups enabled via the RouterBuilder pattern
//! - **Pluggable storage**: PostgreSQL repositories, with in-memory ones for tests
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use contacts_service::{
//!     api::{AppState, RouterBuilder},
//!     config::AppConfig,
//!     repository::{PgContactRepository, PgUserRepository},
//!     service::{storage_from_config, LogMailer},
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::from_env()?;
//!     let pool = config.database.create_pool().await?;
//!
//!     let state = AppState::from_config(
//!         &config,
//!         Arc::new(PgUserRepository::new(pool.clone())),
//!         Arc::new(PgContactRepository::new(pool)),
//!         Arc::new(LogMailer),
//!         storage_from_config(&config.avatar, &config.server.base_url),
//!     )?;
//!
//!     let app = RouterBuilder::with_all_routes()
//!         .build(&state)
//!         .with_state(state);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - **API Layer**: HTTP handlers, middleware and route definitions
//! - **Service Layer**: auth flows, contacts, email, avatars and rate limiting
//! - **Repository**: storage traits with PostgreSQL and in-memory implementations
//! - **Models**: data structures and request/response shapes
//! - **Utils**: errors, password hashing and validation

/// HTTP API layer with handlers and configurable routing
pub mod api;

/// Configuration management for all service settings
pub mod config;

/// Database connection management and configuration
pub mod database;

/// Data models and request/response structures
pub mod models;

/// Storage traits and their implementations
pub mod repository;

/// Business logic
pub mod service;

/// Shared utilities for security, validation, and error handling
pub mod utils;

// Re-export commonly used types for convenient access
pub use api::{create_routes, AppState, RouterBuilder};
pub use models::{
    ContactModel, ContactResponse, LoginForm, MessageResponse, RequestEmail, ResetPassword, Role,
    Token, User, UserCreate,
};
pub use service::{
    AuthService, ContactService, EmailService, JwtService, RateLimitService, UserService,
};
pub use utils::error::{AppError, AppResult, ErrorResponse};

// Re-export database utilities for configuration
pub use database::{DatabaseConfig, DatabasePool};

// Re-export configuration system
pub use config::{env, AppConfig, AvatarConfig, EmailConfig, JwtConfig, ServerConfig};

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
