use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use consultation_cell::ConsultationService;
use medical_record_cell::FingerprintRequest;
use shared_database::AppState;
use shared_models::auth::AuthenticatedDoctor;
use shared_models::error::AppError;
use shared_utils::extractor::AppJson;

use crate::models::{CreatePatientRequest, EnrollFingerprintRequest, PatientSearchQuery};
use crate::services::PatientService;

#[axum::debug_handler]
pub async fn create_patient(
    State(state): State<Arc<AppState>>,
    Extension(doctor): Extension<AuthenticatedDoctor>,
    AppJson(request): AppJson<CreatePatientRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let service = PatientService::new(&state.db);

    let created = service.create_patient_with_record(doctor.id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Patient created successfully",
            "patient": created.patient,
            "medical_record": created.medical_record
        })),
    ))
}

#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<Arc<AppState>>,
    Extension(doctor): Extension<AuthenticatedDoctor>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&state.db);

    let patients = service.list_for_doctor(doctor.id).await?;

    Ok(Json(json!({
        "total": patients.len(),
        "patients": patients
    })))
}

#[axum::debug_handler]
pub async fn search_patients(
    State(state): State<Arc<AppState>>,
    Extension(doctor): Extension<AuthenticatedDoctor>,
    Query(query): Query<PatientSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&state.db);

    let patients = service
        .search_by_name(doctor.id, query.full_name.as_deref().unwrap_or_default())
        .await?;

    Ok(Json(json!({
        "total": patients.len(),
        "patients": patients
    })))
}

#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<Arc<AppState>>,
    Extension(doctor): Extension<AuthenticatedDoctor>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&state.db);

    let patient = service.get_patient(patient_id, doctor.id).await?;

    Ok(Json(json!({
        "has_fingerprint": patient.has_fingerprint(),
        "age": patient.age(),
        "patient": patient
    })))
}

#[axum::debug_handler]
pub async fn enroll_fingerprint(
    State(state): State<Arc<AppState>>,
    Extension(doctor): Extension<AuthenticatedDoctor>,
    Path(patient_id): Path<i64>,
    AppJson(request): AppJson<EnrollFingerprintRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&state.db);

    let patient = service.enroll_fingerprint(patient_id, doctor.id, request).await?;

    Ok(Json(json!({
        "message": "Fingerprint added successfully",
        "patient": patient
    })))
}

#[axum::debug_handler]
pub async fn search_by_fingerprint(
    State(state): State<Arc<AppState>>,
    Extension(_doctor): Extension<AuthenticatedDoctor>,
    AppJson(request): AppJson<FingerprintRequest>,
) -> Result<Json<Value>, AppError> {
    let service = PatientService::new(&state.db);

    let found = service.find_by_fingerprint(&request).await?;

    Ok(Json(json!({
        "patient": found.patient,
        "medical_record": found.medical_record
    })))
}

#[axum::debug_handler]
pub async fn get_patient_consultations(
    State(state): State<Arc<AppState>>,
    Extension(doctor): Extension<AuthenticatedDoctor>,
    Path(patient_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    PatientService::new(&state.db).get_patient(patient_id, doctor.id).await?;

    let consultations = ConsultationService::new(&state.db)
        .list_for_patient(patient_id)
        .await?;

    Ok(Json(json!({ "consultations": consultations })))
}
