use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use medical_record_cell::{AccessResolver, RecordSearchQuery, RecordService};
use shared_database::AppState;
use shared_models::auth::AuthenticatedDoctor;
use shared_models::error::AppError;
use shared_utils::extractor::AppJson;

use crate::models::{
    ChangePasswordRequest, ExportFormat, ExportQuery, MonthlyReportQuery, ReportMonth, UpdateProfileRequest,
};
use crate::services::{DoctorService, ExportService, ReportService};

// ==============================================================================
// PROFILE
// ==============================================================================

#[axum::debug_handler]
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(doctor): Extension<AuthenticatedDoctor>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&state.db);

    let profile = service.get_doctor(doctor.id).await?;

    Ok(Json(json!({ "doctor": profile })))
}

#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(doctor): Extension<AuthenticatedDoctor>,
    AppJson(request): AppJson<UpdateProfileRequest>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&state.db);

    let profile = service.update_profile(doctor.id, request).await?;

    Ok(Json(json!({
        "message": "Profile updated successfully",
        "doctor": profile
    })))
}

#[axum::debug_handler]
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(doctor): Extension<AuthenticatedDoctor>,
    AppJson(request): AppJson<ChangePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    let service = DoctorService::new(&state.db);

    service.change_password(doctor.id, request).await?;

    Ok(Json(json!({ "message": "Password changed successfully" })))
}

// ==============================================================================
// DASHBOARD
// ==============================================================================

#[axum::debug_handler]
pub async fn get_statistics(
    State(state): State<Arc<AppState>>,
    Extension(doctor): Extension<AuthenticatedDoctor>,
) -> Result<Json<Value>, AppError> {
    let service = ReportService::new(&state.db);

    let statistics = service.statistics(doctor.id).await?;

    Ok(Json(json!({ "statistics": statistics })))
}

#[axum::debug_handler]
pub async fn search_records(
    State(state): State<Arc<AppState>>,
    Extension(doctor): Extension<AuthenticatedDoctor>,
    Query(query): Query<RecordSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let resolver = AccessResolver::new(&state.db);

    let results = resolver.search_for_doctor(doctor.id, &query).await?;

    Ok(Json(json!({
        "total": results.len(),
        "results": results
    })))
}

#[axum::debug_handler]
pub async fn list_medical_records(
    State(state): State<Arc<AppState>>,
    Extension(doctor): Extension<AuthenticatedDoctor>,
) -> Result<Json<Value>, AppError> {
    let service = RecordService::new(&state.db);

    let records = service.list_for_doctor(doctor.id).await?;

    Ok(Json(json!({
        "total": records.len(),
        "medical_records": records
    })))
}

#[axum::debug_handler]
pub async fn get_notifications(
    State(state): State<Arc<AppState>>,
    Extension(doctor): Extension<AuthenticatedDoctor>,
) -> Result<Json<Value>, AppError> {
    let service = ReportService::new(&state.db);

    let notices = service.follow_up_notices(doctor.id).await?;

    Ok(Json(json!({
        "total": notices.len(),
        "notifications": notices
    })))
}

// ==============================================================================
// REPORTS & EXPORT
// ==============================================================================

#[axum::debug_handler]
pub async fn monthly_consultations_report(
    State(state): State<Arc<AppState>>,
    Extension(doctor): Extension<AuthenticatedDoctor>,
    Query(query): Query<MonthlyReportQuery>,
) -> Result<Json<Value>, AppError> {
    let month = ReportMonth::resolve(&query, Utc::now().date_naive())?;
    let service = ReportService::new(&state.db);

    let report = service.monthly_consultations(doctor.id, month).await?;

    Ok(Json(json!({ "report": report })))
}

#[axum::debug_handler]
pub async fn patient_growth_report(
    State(state): State<Arc<AppState>>,
    Extension(doctor): Extension<AuthenticatedDoctor>,
) -> Result<Json<Value>, AppError> {
    let service = ReportService::new(&state.db);

    let growth = service.patient_growth(doctor.id).await?;

    Ok(Json(json!({ "growth": growth })))
}

#[axum::debug_handler]
pub async fn export_patient(
    State(state): State<Arc<AppState>>,
    Extension(doctor): Extension<AuthenticatedDoctor>,
    Path(patient_id): Path<i64>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppError> {
    let format = ExportFormat::parse(query.format.as_deref())?;
    let service = ExportService::new(&state.db);

    let export = service.export_patient(patient_id, doctor.id).await?;

    match format {
        ExportFormat::Json => Ok(Json(json!({ "export": export })).into_response()),
        ExportFormat::Csv => {
            let disposition = format!("attachment; filename=\"{}.csv\"", export.patient.unique_code);
            Ok((
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                ExportService::to_csv(&export),
            )
                .into_response())
        }
    }
}
