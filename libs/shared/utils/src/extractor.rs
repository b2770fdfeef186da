use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequest, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use shared_database::AppState;
use shared_models::error::AppError;

use crate::jwt::validate_token;

/// JSON body extractor whose rejections surface as `AppError::ValidationError`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

pub fn extract_bearer_token(headers: &HeaderMap) -> Result<String, AppError> {
    let auth_header = headers
        .get("Authorization")
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?;

    let auth_value = auth_header
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    match auth_value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(AppError::Auth("Invalid authorization header format".to_string())),
    }
}

// Requires a valid doctor session; the resolved identity goes into request extensions.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_bearer_token(request.headers())?;

    let doctor = validate_token(&token, &state.config.jwt_secret).map_err(AppError::Auth)?;

    if !doctor.is_doctor() {
        return Err(AppError::Forbidden("Access denied. Doctor role required.".to_string()));
    }

    request.extensions_mut().insert(doctor);

    Ok(next.run(request).await)
}
