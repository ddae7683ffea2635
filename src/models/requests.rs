//! Request and Response Models
//!
//! Data structures for API request and response payloads with validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::utils::validation::{email_validator, username_validator};

/// Request payload for registering a new user account
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UserCreate {
    /// Login name (2-50 characters, unique)
    #[validate(custom(function = "username_validator"))]
    pub username: String,

    /// User's email address (must be unique and valid format)
    #[validate(custom(function = "email_validator"))]
    #[validate(length(max = 255, message = "Email must be at most 255 characters"))]
    pub email: String,

    /// User's password (4-128 characters)
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password must be between 4 and 128 characters"
    ))]
    pub password: String,
}

/// Request payload for re-sending the confirmation email
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RequestEmail {
    #[validate(custom(function = "email_validator"))]
    #[validate(length(max = 255, message = "Email must be at most 255 characters"))]
    pub email: String,
}

/// Request payload for starting a password reset
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ResetPassword {
    #[validate(custom(function = "email_validator"))]
    #[validate(length(max = 255, message = "Email must be at most 255 characters"))]
    pub email: String,

    /// The new password, applied once the emailed link is followed
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password must be between 4 and 128 characters"
    ))]
    pub password: String,
}

/// Plain message response used by the auth flows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Response for health check
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}
