//! Validation Utilities
//!
//! Input validation functions for user and contact payloads.

use regex::Regex;
use std::sync::OnceLock;
use validator::ValidationError;

/// Validates email address format using a comprehensive regex pattern
pub fn validate_email(email: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    regex.is_match(email)
}

/// Normalizes email address to lowercase and removes whitespace
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Usernames are 2-50 characters of letters, digits, `_`, `-` and `.`
pub fn validate_username(username: &str) -> bool {
    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9_.\-]{2,50}$").expect("Failed to compile username regex")
    });

    regex.is_match(username)
}

/// Phone numbers allow digits, spaces, `+`, `-` and parentheses, and need at least one digit
pub fn validate_phone_number(phone: &str) -> bool {
    static PHONE_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = PHONE_REGEX.get_or_init(|| {
        Regex::new(r"^[0-9+()\- ]+$").expect("Failed to compile phone regex")
    });

    regex.is_match(phone) && phone.chars().any(|c| c.is_ascii_digit())
}

/// Escapes `LIKE` wildcards so user input only ever matches literally
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Custom validator for email fields using the validator crate
pub fn email_validator(email: &str) -> Result<(), ValidationError> {
    if validate_email(email) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_email").with_message(messages::INVALID_EMAIL.into()))
    }
}

/// Custom validator for username fields
pub fn username_validator(username: &str) -> Result<(), ValidationError> {
    if validate_username(username) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_username")
            .with_message(messages::INVALID_USERNAME.into()))
    }
}

/// Custom validator for contact phone numbers
pub fn phone_validator(phone: &str) -> Result<(), ValidationError> {
    if validate_phone_number(phone) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_phone").with_message(messages::INVALID_PHONE.into()))
    }
}

/// Validation error messages for user-friendly responses
pub mod messages {
    pub const INVALID_EMAIL: &str = "Please enter a valid email address";
    pub const INVALID_USERNAME: &str =
        "Username must be 2-50 characters of letters, digits, '_', '-' or '.'";
    pub const INVALID_PHONE: &str =
        "Phone number may only contain digits, spaces, '+', '-' and parentheses";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com"));
        assert!(validate_email("test.user+tag@domain.co.uk"));
        assert!(!validate_email("invalid.email"));
        assert!(!validate_email("@domain.com"));
        assert!(!validate_email("user@"));
        assert!(!validate_email(""));
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  USER@EXAMPLE.COM  "), "user@example.com");
        assert_eq!(normalize_email("Test@Domain.org"), "test@domain.org");
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("agent007"));
        assert!(validate_username("jane.doe-1_x"));
        assert!(!validate_username("a"));
        assert!(!validate_username("has space"));
        assert!(!validate_username("semi;colon"));
        assert!(!validate_username(&"a".repeat(51)));
    }

    #[test]
    fn test_validate_phone_number() {
        assert!(validate_phone_number("123-456-7890"));
        assert!(validate_phone_number("+38 (050) 123"));
        assert!(!validate_phone_number("call me"));
        assert!(!validate_phone_number("--- ---"));
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("john"), "john");
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
    }
}
