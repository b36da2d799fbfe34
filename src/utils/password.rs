use crate::error::{AppError, AppResult};
use bcrypt::{DEFAULT_COST, hash, verify};

/// Password rule: 8-128 characters with at least one letter, one digit and
/// one special character.
pub fn validate_password(password: &str) -> AppResult<()> {
    if password.len() < 8 || password.len() > 128 {
        return Err(AppError::ValidationError(
            "Password must be between 8 and 128 characters".to_string(),
        ));
    }

    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| c.is_ascii_punctuation());

    if !has_letter || !has_digit || !has_special {
        return Err(AppError::ValidationError(
            "Password must contain at least one letter, one digit and one special character"
                .to_string(),
        ));
    }

    Ok(())
}

pub fn hash_password(password: &str) -> AppResult<String> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::InternalError(format!("Failed to hash password: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    verify(password, hash)
        .map_err(|e| AppError::InternalError(format!("Failed to verify password: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password() {
        assert!(validate_password("Pass@word1").is_ok());
        assert!(validate_password("p4ss!word").is_ok());
        assert!(validate_password("Password!").is_err()); // no digit
        assert!(validate_password("Password1").is_err()); // no special character
        assert!(validate_password("12345678!").is_err()); // no letter
        assert!(validate_password("Pw1!").is_err()); // too short
    }

    #[test]
    fn test_hash_and_verify_password() {
        let password = "Pass@word1";
        let hashed = hash_password(password).unwrap();

        assert!(verify_password(password, &hashed).unwrap());
        assert!(!verify_password("Wrong@pass1", &hashed).unwrap());
    }
}
