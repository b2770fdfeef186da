use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use tracing::instrument;

use shared_models::error::AppError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

pub struct PasswordService;

impl PasswordService {
    #[instrument(skip(password))]
    pub fn hash_password(password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        let password_hash = argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;
        Ok(password_hash.to_string())
    }

    /// Constant-time check of `password` against a stored PHC hash string.
    #[instrument(skip(password, hash))]
    pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Stored password hash is malformed: {}", e)))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::Internal(format!("Password verification failed: {}", e))),
        }
    }

    /// Returns the list of rule violations; empty means acceptable.
    pub fn password_issues(password: &str) -> Vec<String> {
        let mut issues = Vec::new();

        if password.chars().count() < MIN_PASSWORD_LENGTH {
            issues.push(format!("Password must be at least {} characters long", MIN_PASSWORD_LENGTH));
        }
        if !password.chars().any(|c| c.is_lowercase()) {
            issues.push("Password must contain a lowercase letter".to_string());
        }
        if !password.chars().any(|c| c.is_uppercase()) {
            issues.push("Password must contain an uppercase letter".to_string());
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            issues.push("Password must contain a number".to_string());
        }

        issues
    }

    pub fn ensure_strong(password: &str) -> Result<(), AppError> {
        let issues = Self::password_issues(password);
        if issues.is_empty() {
            Ok(())
        } else {
            Err(AppError::ValidationError(issues.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = PasswordService::hash_password("Aa12345678").unwrap();

        assert_ne!(hash, "Aa12345678");
        assert!(hash.starts_with("$argon2"));
        assert!(PasswordService::verify_password("Aa12345678", &hash).unwrap());
        assert!(!PasswordService::verify_password("Aa12345679", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let first = PasswordService::hash_password("Aa12345678").unwrap();
        let second = PasswordService::hash_password("Aa12345678").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_password_rules() {
        assert!(PasswordService::ensure_strong("Aa12345678").is_ok());
        assert_eq!(PasswordService::password_issues("short1A").len(), 1);
        assert_eq!(PasswordService::password_issues("alllowercase").len(), 2);
        assert!(PasswordService::ensure_strong("NODIGITSHERE").is_err());
    }

    #[test]
    fn test_malformed_hash_is_internal_error() {
        let result = PasswordService::verify_password("Aa12345678", "not-a-phc-string");
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}
