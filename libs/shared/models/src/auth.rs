use serde::{Deserialize, Serialize};

pub const DOCTOR_ROLE: &str = "doctor";

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub email: String,
    pub role: String,
    pub iat: u64,
    pub exp: u64,
}

/// Identity resolved from a valid session token, stored in request extensions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedDoctor {
    pub id: i64,
    pub email: String,
    pub role: String,
}

impl AuthenticatedDoctor {
    pub fn is_doctor(&self) -> bool {
        self.role == DOCTOR_ROLE
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub valid: bool,
    pub doctor_id: i64,
    pub email: String,
    pub role: String,
}
