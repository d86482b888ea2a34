//! User validation utilities

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Errors that can occur during user validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserValidationError {
    #[error("Email cannot be empty")]
    EmptyEmail,

    #[error("Email address is not valid")]
    InvalidEmail,

    #[error("Email exceeds maximum length of {0} characters")]
    EmailTooLong(usize),

    #[error("Username must be at least {0} characters")]
    UsernameTooShort(usize),

    #[error("Username must be at most {0} characters")]
    UsernameTooLong(usize),

    #[error("Password must be at least {0} characters")]
    PasswordTooShort(usize),

    #[error("Password must be at most {0} characters")]
    PasswordTooLong(usize),
}

const MAX_EMAIL_LENGTH: usize = 255;
const MIN_USERNAME_LENGTH: usize = 2;
const MAX_USERNAME_LENGTH: usize = 20;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 72;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Validate an email address (shape only; deliverability is not checked)
pub fn validate_email(email: &str) -> Result<(), UserValidationError> {
    if email.is_empty() {
        return Err(UserValidationError::EmptyEmail);
    }

    if email.chars().count() > MAX_EMAIL_LENGTH {
        return Err(UserValidationError::EmailTooLong(MAX_EMAIL_LENGTH));
    }

    if !EMAIL_PATTERN.is_match(email) {
        return Err(UserValidationError::InvalidEmail);
    }

    Ok(())
}

/// Validate a display name: 2 to 20 characters
pub fn validate_username(username: &str) -> Result<(), UserValidationError> {
    let len = username.chars().count();

    if len < MIN_USERNAME_LENGTH {
        return Err(UserValidationError::UsernameTooShort(MIN_USERNAME_LENGTH));
    }

    if len > MAX_USERNAME_LENGTH {
        return Err(UserValidationError::UsernameTooLong(MAX_USERNAME_LENGTH));
    }

    Ok(())
}

/// Validate a password: 8 to 72 characters
pub fn validate_password(password: &str) -> Result<(), UserValidationError> {
    let len = password.chars().count();

    if len < MIN_PASSWORD_LENGTH {
        return Err(UserValidationError::PasswordTooShort(MIN_PASSWORD_LENGTH));
    }

    if len > MAX_PASSWORD_LENGTH {
        return Err(UserValidationError::PasswordTooLong(MAX_PASSWORD_LENGTH));
    }

    Ok(())
}

/// Lowercase and trim an email for lookups
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_emails() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("first.last+tag@mail.co.kr").is_ok());
    }

    #[test]
    fn test_invalid_emails() {
        assert_eq!(validate_email(""), Err(UserValidationError::EmptyEmail));
        assert_eq!(
            validate_email("no-at-sign"),
            Err(UserValidationError::InvalidEmail)
        );
        assert_eq!(
            validate_email("a b@example.com"),
            Err(UserValidationError::InvalidEmail)
        );
    }

    #[test]
    fn test_username_bounds() {
        assert!(validate_username("김철").is_ok());
        assert_eq!(
            validate_username("a"),
            Err(UserValidationError::UsernameTooShort(2))
        );
        assert_eq!(
            validate_username(&"a".repeat(21)),
            Err(UserValidationError::UsernameTooLong(20))
        );
    }

    #[test]
    fn test_password_bounds() {
        assert!(validate_password("password").is_ok());
        assert_eq!(
            validate_password("short"),
            Err(UserValidationError::PasswordTooShort(8))
        );
        assert_eq!(
            validate_password(&"p".repeat(73)),
            Err(UserValidationError::PasswordTooLong(72))
        );
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  User@Example.COM "), "user@example.com");
    }
}
