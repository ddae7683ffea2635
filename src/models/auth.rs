//! Authentication Models
//!
//! Data structures for bearer tokens, JWT claims and the login form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Bearer token returned by a successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// Short-lived access token for API authentication
    pub access_token: String,

    /// Token type (always "bearer")
    pub token_type: String,
}

impl Token {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// Purpose of a JWT, carried in its `type` claim
///
/// A token issued for one purpose is never accepted for another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    Access,
    EmailVerification,
    PasswordReset,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenType::Access => "access",
            TokenType::EmailVerification => "email_verification",
            TokenType::PasswordReset => "password_reset",
        };
        f.write_str(name)
    }
}

/// JWT claims shared by every token the service issues
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: username for access tokens, email address otherwise
    pub sub: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// JWT ID - unique token identifier
    pub jti: String,

    #[serde(rename = "type")]
    pub token_type: TokenType,

    /// bcrypt hash of the requested password (password reset tokens only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Claims {
    pub fn new(
        subject: &str,
        token_type: TokenType,
        expires_at: DateTime<Utc>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: subject.to_string(),
            exp: expires_at.timestamp(),
            iat: issued_at.timestamp(),
            jti: Uuid::new_v4().to_string(),
            token_type,
            password: None,
        }
    }

    pub fn with_password(mut self, password_hash: String) -> Self {
        self.password = Some(password_hash);
        self
    }
}

/// OAuth2 password-flow login form
///
/// Extra form fields such as `grant_type` and `scope` are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}
