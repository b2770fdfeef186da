use serde::{Deserialize, Serialize};

use doctor_cell::Doctor;
use shared_models::error::AppError;
use shared_utils::password::PasswordService;
use shared_utils::validation::{check_length, is_valid_email, is_valid_phone, require_non_empty};

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub license_number: String,
    pub specialization: String,
    pub phone: Option<String>,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if !is_valid_email(self.email.trim()) {
            return Err(AppError::ValidationError("Invalid email format".to_string()));
        }
        PasswordService::ensure_strong(&self.password)?;
        check_length("full_name", self.full_name.trim(), 3, 255)?;
        require_non_empty("license_number", &self.license_number)?;
        require_non_empty("specialization", &self.specialization)?;
        if let Some(phone) = &self.phone {
            if !is_valid_phone(phone) {
                return Err(AppError::ValidationError("Invalid phone number format".to_string()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if !is_valid_email(self.email.trim()) {
            return Err(AppError::ValidationError("Invalid email format".to_string()));
        }
        require_non_empty("password", &self.password)
    }
}

/// A doctor together with a freshly issued session token.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub doctor: Doctor,
}
