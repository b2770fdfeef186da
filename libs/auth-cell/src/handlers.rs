use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_database::AppState;
use shared_models::auth::TokenResponse;
use shared_models::error::AppError;
use shared_utils::extractor::{extract_bearer_token, AppJson};
use shared_utils::jwt::validate_token;

use crate::models::{LoginRequest, RegisterRequest};
use crate::services::AuthService;

#[axum::debug_handler]
pub async fn register_doctor(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = AuthService::new(&state);

    let session = service.register(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Doctor registered successfully",
            "token": session.token,
            "doctor": session.doctor
        })),
    ))
}

#[axum::debug_handler]
pub async fn login_doctor(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AuthService::new(&state);

    let session = service.login(request).await?;

    Ok(Json(json!({
        "message": "Login successful",
        "token": session.token,
        "doctor": session.doctor
    })))
}

pub async fn validate_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>, AppError> {
    debug!("Validating token");

    let token = extract_bearer_token(&headers)?;

    match validate_token(&token, &state.config.jwt_secret) {
        Ok(doctor) => Ok(Json(TokenResponse {
            valid: true,
            doctor_id: doctor.id,
            email: doctor.email,
            role: doctor.role,
        })),
        Err(err) => Err(AppError::Auth(err)),
    }
}

/// Never fails on a bad token; reports `valid: false` instead.
pub async fn verify_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<Value> {
    debug!("Verifying token");

    let valid = extract_bearer_token(&headers)
        .ok()
        .is_some_and(|token| validate_token(&token, &state.config.jwt_secret).is_ok());

    Json(json!({ "valid": valid }))
}
