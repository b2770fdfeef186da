use std::sync::Arc;

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use consultation_cell::{ConsultationPayload, ConsultationService};
use shared_database::AppState;
use shared_models::auth::AuthenticatedDoctor;
use shared_models::error::AppError;
use shared_utils::extractor::AppJson;

use crate::models::{FingerprintAccess, FingerprintRequest, RecordAccess, RecordAttributes, RecordCodeRequest};
use crate::services::{AccessResolver, RecordService};

/// Public: anyone holding the record code can read the record.
#[axum::debug_handler]
pub async fn access_by_record_code(
    State(state): State<Arc<AppState>>,
    AppJson(request): AppJson<RecordCodeRequest>,
) -> Result<Json<RecordAccess>, AppError> {
    let resolver = AccessResolver::new(&state.db);

    let access = resolver.by_record_code(request.record_code.trim()).await?;

    Ok(Json(access))
}

#[axum::debug_handler]
pub async fn access_by_fingerprint(
    State(state): State<Arc<AppState>>,
    Extension(_doctor): Extension<AuthenticatedDoctor>,
    AppJson(request): AppJson<FingerprintRequest>,
) -> Result<Json<FingerprintAccess>, AppError> {
    let resolver = AccessResolver::new(&state.db);

    let access = resolver.by_fingerprint(&request).await?;

    Ok(Json(access))
}

#[axum::debug_handler]
pub async fn update_medical_record(
    State(state): State<Arc<AppState>>,
    Extension(doctor): Extension<AuthenticatedDoctor>,
    Path(medical_record_id): Path<i64>,
    AppJson(attributes): AppJson<RecordAttributes>,
) -> Result<Json<Value>, AppError> {
    let service = RecordService::new(&state.db);

    let record = service.update_record(medical_record_id, doctor.id, attributes).await?;

    Ok(Json(json!({
        "message": "Medical record updated successfully",
        "medical_record": record
    })))
}

#[axum::debug_handler]
pub async fn add_consultation(
    State(state): State<Arc<AppState>>,
    Extension(doctor): Extension<AuthenticatedDoctor>,
    Path(medical_record_id): Path<i64>,
    AppJson(payload): AppJson<ConsultationPayload>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = ConsultationService::new(&state.db);

    let consultation = service.add_consultation(medical_record_id, doctor.id, payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Consultation added successfully",
            "consultation_id": consultation.id,
            "consultation": consultation
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_record_consultations(
    State(state): State<Arc<AppState>>,
    Extension(doctor): Extension<AuthenticatedDoctor>,
    Path(medical_record_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = ConsultationService::new(&state.db);

    let consultations = service.history_for_doctor(medical_record_id, doctor.id).await?;

    Ok(Json(json!({ "consultations": consultations })))
}
