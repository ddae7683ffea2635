//! Service Layer
//!
//! Business logic for accounts, authentication, contacts, email and avatars.

pub mod auth;
pub mod birthdays;
pub mod contacts;
pub mod email_service;
pub mod jwt;
pub mod rate_limit_service;
pub mod upload;
pub mod user;

// Re-export services
pub use auth::AuthService;
pub use contacts::ContactService;
pub use email_service::{EmailService, LogMailer, Mailer, OutgoingEmail, SmtpMailer};
pub use jwt::JwtService;
pub use rate_limit_service::RateLimitService;
pub use upload::{
    storage_from_config, AvatarStorage, AvatarUpload, CloudinaryStorage, LocalAvatarStorage,
};
pub use user::UserService;
