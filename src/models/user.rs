//! User Model
//!
//! Core user data structures and type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role, persisted as the `user_role` PostgreSQL enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Default for Role {
    fn default() -> Self {
        Role::User
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role '{}', expected 'user' or 'admin'", other)),
        }
    }
}

/// User representation for external API responses
///
/// Carries no password hash, role or confirmation flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for the user
    pub id: i64,

    /// Login name (unique)
    pub username: String,

    /// User's email address (unique, normalized)
    pub email: String,

    /// Optional URL to the user's avatar
    pub avatar: Option<String>,
}

/// Stored user account including the password hash
///
/// Used by services for authentication and authorization decisions. It's never
/// exposed in API responses.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserAccount {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// bcrypt hashed password
    pub hashed_password: String,
    pub avatar: Option<String>,
    /// Whether the user's email address has been confirmed
    pub confirmed: bool,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

impl From<UserAccount> for User {
    /// Strips the password hash and account flags
    fn from(account: UserAccount) -> Self {
        User {
            id: account.id,
            username: account.username,
            email: account.email,
            avatar: account.avatar,
        }
    }
}

/// Values needed to insert a new account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub hashed_password: String,
    pub avatar: Option<String>,
    pub confirmed: bool,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> UserAccount {
        UserAccount {
            id: 7,
            username: "agent007".to_string(),
            email: "agent007@gmail.com".to_string(),
            hashed_password: "hashed_password".to_string(),
            avatar: Some("https://example.com/avatar.jpg".to_string()),
            confirmed: true,
            role: Role::Admin,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_account_conversion() {
        let user: User = account().into();

        assert_eq!(user.id, 7);
        assert_eq!(user.username, "agent007");
        assert_eq!(user.email, "agent007@gmail.com");
        assert_eq!(
            user.avatar,
            Some("https://example.com/avatar.jpg".to_string())
        );
    }

    #[test]
    fn test_user_serialization_has_no_secrets() {
        let user: User = account().into();
        let json = serde_json::to_value(&user).unwrap();

        assert!(json.get("hashed_password").is_none());
        assert!(json.get("role").is_none());
        assert!(json.get("confirmed").is_none());
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(" User ".parse::<Role>().unwrap(), Role::User);
        assert!("root".parse::<Role>().is_err());
        assert_eq!(Role::default(), Role::User);
        assert_eq!(Role::Admin.to_string(), "admin");
    }

    #[test]
    fn test_is_admin() {
        let mut account = account();
        assert!(account.is_admin());
        account.role = Role::User;
        assert!(!account.is_admin());
    }
}
