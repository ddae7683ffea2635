//! Security Utilities
//!
//! Password hashing, random tokens, SHA-256 digests and Gravatar URLs.

use bcrypt::{hash, verify, DEFAULT_COST};
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};

/// Default bcrypt cost for password hashing
pub const DEFAULT_BCRYPT_COST: u32 = DEFAULT_COST;

/// Generate a cryptographically secure random string
pub fn generate_secure_token(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Hash a password with custom bcrypt cost
pub fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
    hash(password, cost)
}

/// Verify a password against its hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool, bcrypt::BcryptError> {
    verify(password, hash)
}

/// Lowercase hex SHA-256 digest
pub fn sha256_hex(data: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Default avatar for an email address
///
/// Gravatar accepts SHA-256 hashes of the trimmed, lowercased address.
pub fn gravatar_url(email: &str) -> String {
    format!(
        "https://www.gravatar.com/avatar/{}?d=identicon",
        sha256_hex(&email.trim().to_lowercase())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_secure_token() {
        let token1 = generate_secure_token(32);
        let token2 = generate_secure_token(32);

        assert_eq!(token1.len(), 32);
        assert_ne!(token1, token2);
    }

    #[test]
    fn test_password_hashing() {
        let password = "test_password_123";
        let hash = hash_password_with_cost(password, 4).unwrap();

        assert!(verify_password(password, &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_sha256_hex() {
        let digest = sha256_hex("sensitive_data");
        assert_eq!(digest, sha256_hex("sensitive_data"));
        assert_eq!(digest.len(), 64);
    }

    #[test]
    fn test_gravatar_url_normalizes_email() {
        let url = gravatar_url("  Agent007@Gmail.com ");
        assert_eq!(url, gravatar_url("agent007@gmail.com"));
        assert!(url.starts_with("https://www.gravatar.com/avatar/"));
    }
}
