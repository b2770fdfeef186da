use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use serde_json::{json, Value};

use shared_database::AppState;
use shared_models::auth::AuthenticatedDoctor;
use shared_models::error::AppError;
use shared_utils::extractor::AppJson;

use crate::models::ConsultationPayload;
use crate::services::ConsultationService;

#[axum::debug_handler]
pub async fn get_consultation(
    State(state): State<Arc<AppState>>,
    Extension(doctor): Extension<AuthenticatedDoctor>,
    Path(consultation_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = ConsultationService::new(&state.db);

    let consultation = service.get_consultation_for(consultation_id, doctor.id).await?;

    Ok(Json(json!({ "consultation": consultation })))
}

#[axum::debug_handler]
pub async fn update_consultation(
    State(state): State<Arc<AppState>>,
    Extension(doctor): Extension<AuthenticatedDoctor>,
    Path(consultation_id): Path<i64>,
    AppJson(payload): AppJson<ConsultationPayload>,
) -> Result<Json<Value>, AppError> {
    let service = ConsultationService::new(&state.db);

    let consultation = service
        .update_consultation(consultation_id, doctor.id, payload)
        .await?;

    Ok(Json(json!({
        "message": "Consultation updated successfully",
        "consultation": consultation
    })))
}

#[axum::debug_handler]
pub async fn delete_consultation(
    State(state): State<Arc<AppState>>,
    Extension(doctor): Extension<AuthenticatedDoctor>,
    Path(consultation_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = ConsultationService::new(&state.db);

    service.delete_consultation(consultation_id, doctor.id).await?;

    Ok(Json(json!({ "message": "Consultation deleted successfully" })))
}
