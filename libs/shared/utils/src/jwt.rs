use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;

use shared_models::auth::{AuthenticatedDoctor, JwtClaims, DOCTOR_ROLE};

/// Signs a doctor session token valid for `ttl_hours`.
pub fn issue_token(doctor_id: i64, email: &str, jwt_secret: &str, ttl_hours: i64) -> Result<String, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let now = Utc::now();
    let claims = JwtClaims {
        sub: doctor_id.to_string(),
        email: email.to_string(),
        role: DOCTOR_ROLE.to_string(),
        iat: now.timestamp() as u64,
        exp: (now + Duration::hours(ttl_hours)).timestamp() as u64,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|e| format!("Failed to sign token: {}", e))
}

pub fn validate_token(token: &str, jwt_secret: &str) -> Result<AuthenticatedDoctor, String> {
    if jwt_secret.is_empty() {
        return Err("JWT secret is not set".to_string());
    }

    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<JwtClaims>(token, &DecodingKey::from_secret(jwt_secret.as_bytes()), &validation)
        .map_err(|e| {
            debug!("Token rejected: {}", e);
            match e.kind() {
                ErrorKind::ExpiredSignature => "Token expired".to_string(),
                ErrorKind::InvalidSignature => "Invalid token signature".to_string(),
                _ => "Invalid token".to_string(),
            }
        })?;

    let claims = data.claims;
    let id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| "Invalid token subject".to_string())?;

    debug!("Token validated successfully for doctor: {}", id);
    Ok(AuthenticatedDoctor {
        id,
        email: claims.email,
        role: claims.role,
    })
}
