//! JWT Authentication Service
//!
//! Issues and validates the three token kinds the service uses: access
//! tokens, email verification tokens and password reset tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use crate::config::{ConfigError, JwtConfig};
use crate::models::{Claims, TokenType};
use crate::utils::error::AppError;

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token generation failed: {0}")]
    Generation(String),

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Expected a {expected} token, got {found}")]
    WrongType { expected: TokenType, found: TokenType },

    #[error("Password reset token carries no password")]
    MissingPassword,
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Generation(msg) => AppError::Internal(msg),
            _ => AppError::Validation("Invalid or expired token".to_string()),
        }
    }
}

pub type TokenResult<T> = Result<T, TokenError>;

/// JWT service for token generation and validation
#[derive(Clone)]
pub struct JwtService {
    secret: String,
    algorithm: Algorithm,
    /// Lifetime of access and password reset tokens
    access_token_expires_in: Duration,
    /// Lifetime of email verification tokens
    email_token_expires_in: Duration,
}

impl JwtService {
    /// Create a JWT service with the default lifetimes (1 hour / 7 days)
    pub fn new(secret: String) -> Self {
        Self::with_expiration(secret, Algorithm::HS256, Duration::hours(1), Duration::days(7))
    }

    /// Create a JWT service with custom algorithm and token lifetimes
    pub fn with_expiration(
        secret: String,
        algorithm: Algorithm,
        access_expires_in: Duration,
        email_expires_in: Duration,
    ) -> Self {
        Self {
            secret,
            algorithm,
            access_token_expires_in: access_expires_in,
            email_token_expires_in: email_expires_in,
        }
    }

    /// Build from configuration; out-of-range lifetimes are rejected
    pub fn from_config(config: &JwtConfig) -> Result<Self, ConfigError> {
        let (access_expires_in, email_expires_in) = config.lifetimes()?;
        Ok(Self::with_expiration(
            config.secret.clone(),
            config.algorithm,
            access_expires_in,
            email_expires_in,
        ))
    }

    /// Issue an access token for a username
    pub fn create_access_token(&self, username: &str) -> TokenResult<String> {
        let now = Utc::now();
        let claims = Claims::new(
            username,
            TokenType::Access,
            now + self.access_token_expires_in,
            now,
        );
        self.encode_claims(&claims)
    }

    /// Validate an access token and return its username
    pub fn validate_access_token(&self, token: &str) -> TokenResult<String> {
        let claims = self.decode_claims(token, TokenType::Access)?;
        Ok(claims.sub)
    }

    /// Issue an email verification token for an address
    pub fn create_email_token(&self, email: &str) -> TokenResult<String> {
        let now = Utc::now();
        let claims = Claims::new(
            email,
            TokenType::EmailVerification,
            now + self.email_token_expires_in,
            now,
        );
        self.encode_claims(&claims)
    }

    /// Validate an email verification token and return its address
    pub fn email_from_token(&self, token: &str) -> TokenResult<String> {
        let claims = self.decode_claims(token, TokenType::EmailVerification)?;
        Ok(claims.sub)
    }

    /// Issue a password reset token carrying the new password hash
    pub fn create_reset_token(&self, email: &str, password_hash: &str) -> TokenResult<String> {
        let now = Utc::now();
        let claims = Claims::new(
            email,
            TokenType::PasswordReset,
            now + self.access_token_expires_in,
            now,
        )
        .with_password(password_hash.to_string());
        self.encode_claims(&claims)
    }

    /// Validate a password reset token and return `(email, password_hash)`
    pub fn decode_reset_token(&self, token: &str) -> TokenResult<(String, String)> {
        let claims = self.decode_claims(token, TokenType::PasswordReset)?;
        let password = claims.password.ok_or(TokenError::MissingPassword)?;
        Ok((claims.sub, password))
    }

    fn encode_claims(&self, claims: &Claims) -> TokenResult<String> {
        let header = Header::new(self.algorithm);
        let encoding_key = EncodingKey::from_secret(self.secret.as_ref());

        encode(&header, claims, &encoding_key).map_err(|e| TokenError::Generation(e.to_string()))
    }

    fn decode_claims(&self, token: &str, expected: TokenType) -> TokenResult<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = true;
        validation.validate_aud = false;

        let decoding_key = DecodingKey::from_secret(self.secret.as_ref());

        let claims = decode::<Claims>(token, &decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| TokenError::Invalid(e.to_string()))?;

        if claims.token_type != expected {
            return Err(TokenError::WrongType {
                expected,
                found: claims.token_type,
            });
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> JwtService {
        JwtService::new("test_secret_key".to_string())
    }

    #[test]
    fn test_access_token_round_trip() {
        let service = create_test_service();
        let token = service.create_access_token("agent007").unwrap();

        assert_eq!(service.validate_access_token(&token).unwrap(), "agent007");
    }

    #[test]
    fn test_from_config_rejects_out_of_range_lifetimes() {
        let mut config = JwtConfig {
            secret: "test_secret_key".to_string(),
            algorithm: Algorithm::HS512,
            access_token_expires_seconds: 600,
            email_token_expires_days: 2,
        };

        let service = JwtService::from_config(&config).unwrap();
        let token = service.create_access_token("agent007").unwrap();
        assert_eq!(service.validate_access_token(&token).unwrap(), "agent007");

        config.email_token_expires_days = i64::MAX;
        assert!(JwtService::from_config(&config).is_err());

        config.email_token_expires_days = 2;
        config.access_token_expires_seconds = i64::MAX;
        assert!(JwtService::from_config(&config).is_err());
    }

    #[test]
    fn test_token_types_are_not_interchangeable() {
        let service = create_test_service();
        let email_token = service.create_email_token("agent007@gmail.com").unwrap();
        let access_token = service.create_access_token("agent007").unwrap();

        assert!(matches!(
            service.validate_access_token(&email_token),
            Err(TokenError::WrongType { .. })
        ));
        assert!(matches!(
            service.email_from_token(&access_token),
            Err(TokenError::WrongType { .. })
        ));
        assert!(service.decode_reset_token(&email_token).is_err());
    }

    #[test]
    fn test_reset_token_carries_password_hash() {
        let service = create_test_service();
        let token = service
            .create_reset_token("agent007@gmail.com", "$2b$04$hash")
            .unwrap();

        let (email, hash) = service.decode_reset_token(&token).unwrap();
        assert_eq!(email, "agent007@gmail.com");
        assert_eq!(hash, "$2b$04$hash");
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = create_test_service().create_access_token("agent007").unwrap();
        let other = JwtService::new("another_secret".to_string());

        assert!(matches!(
            other.validate_access_token(&token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = JwtService::with_expiration(
            "test_secret_key".to_string(),
            Algorithm::HS256,
            Duration::hours(-2),
            Duration::days(-1),
        );

        let access = service.create_access_token("agent007").unwrap();
        let email = service.create_email_token("agent007@gmail.com").unwrap();

        assert!(service.validate_access_token(&access).is_err());
        assert!(service.email_from_token(&email).is_err());
    }

    #[test]
    fn test_algorithm_mismatch_is_rejected() {
        let hs512 = JwtService::with_expiration(
            "test_secret_key".to_string(),
            Algorithm::HS512,
            Duration::hours(1),
            Duration::days(7),
        );
        let token = hs512.create_access_token("agent007").unwrap();

        assert!(create_test_service().validate_access_token(&token).is_err());
        assert_eq!(hs512.validate_access_token(&token).unwrap(), "agent007");
    }

    #[test]
    fn test_garbage_token_maps_to_validation_error() {
        let err = create_test_service()
            .email_from_token("not-a-token")
            .unwrap_err();
        let app_error: AppError = err.into();
        assert!(matches!(app_error, AppError::Validation(ref m) if m == "Invalid or expired token"));
    }
}
