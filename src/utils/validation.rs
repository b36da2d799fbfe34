use crate::error::{AppError, AppResult};
use regex::Regex;
use std::sync::OnceLock;

// Compiled once at first use and shared across requests; the validators
// themselves are stateless.
static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static CONTACT_RE: OnceLock<Regex> = OnceLock::new();

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._%+-]*@[A-Za-z0-9.-]+$").unwrap())
}

fn contact_re() -> &'static Regex {
    CONTACT_RE.get_or_init(|| Regex::new(r"^\d{10}$").unwrap())
}

pub fn validate_name(field: &str, value: &str) -> AppResult<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.chars().count() > 50 {
        return Err(AppError::ValidationError(format!(
            "{field} must be between 1 and 50 characters"
        )));
    }
    Ok(())
}

/// Accounts are limited to the configured institutional domain.
pub fn validate_institutional_email(email: &str, domain: &str) -> AppResult<()> {
    if !email_re().is_match(email) {
        return Err(AppError::ValidationError(
            "Email address is not valid".to_string(),
        ));
    }

    let suffix = format!("@{}", domain.to_ascii_lowercase());
    if !email.to_ascii_lowercase().ends_with(&suffix) {
        return Err(AppError::ValidationError(format!(
            "Email must belong to the {domain} domain"
        )));
    }

    Ok(())
}

pub fn validate_age(age: i32) -> AppResult<()> {
    if !(16..=100).contains(&age) {
        return Err(AppError::ValidationError(
            "Age must be between 16 and 100".to_string(),
        ));
    }
    Ok(())
}

/// Contact numbers are plain 10-digit strings, no country prefix.
pub fn validate_contact_number(contact: &str) -> AppResult<()> {
    if !contact_re().is_match(contact) {
        return Err(AppError::ValidationError(
            "Contact number must be exactly 10 digits".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_institutional_email() {
        assert!(validate_institutional_email("rahul.s@campus.edu", "campus.edu").is_ok());
        assert!(validate_institutional_email("Rahul.S@Campus.EDU", "campus.edu").is_ok());
        // well-formed but outside the domain
        assert!(validate_institutional_email("rahul.s@gmail.com", "campus.edu").is_err());
        // the institutional domain must be the suffix of the domain part
        assert!(validate_institutional_email("rahul@campus.edu.evil.com", "campus.edu").is_err());
        assert!(validate_institutional_email("not-an-email", "campus.edu").is_err());
        assert!(validate_institutional_email("@campus.edu", "campus.edu").is_err());
    }

    #[test]
    fn test_validate_age() {
        assert!(validate_age(16).is_ok());
        assert!(validate_age(100).is_ok());
        assert!(validate_age(15).is_err());
        assert!(validate_age(101).is_err());
    }

    #[test]
    fn test_validate_contact_number() {
        assert!(validate_contact_number("9876543210").is_ok());
        assert!(validate_contact_number("987654321").is_err()); // 9 digits
        assert!(validate_contact_number("98765432100").is_err()); // 11 digits
        assert!(validate_contact_number("987654321a").is_err());
        assert!(validate_contact_number("+919876543210").is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("firstName", "Rahul").is_ok());
        assert!(validate_name("firstName", "José").is_ok());
        assert!(validate_name("firstName", "").is_err());
        assert!(validate_name("firstName", "   ").is_err());
        assert!(validate_name("lastName", &"x".repeat(51)).is_err());
        // The limit counts characters, so accented names get the full budget
        assert!(validate_name("lastName", &"é".repeat(50)).is_ok());
        assert!(validate_name("lastName", &"é".repeat(51)).is_err());
    }
}
