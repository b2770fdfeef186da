use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppState>) -> Router {
    Router::new()
        // Profile
        .route("/profile", get(handlers::get_profile).put(handlers::update_profile))
        .route("/change-password", put(handlers::change_password))
        // Dashboard
        .route("/statistics", get(handlers::get_statistics))
        .route("/search", get(handlers::search_records))
        .route("/medical-records", get(handlers::list_medical_records))
        .route("/notifications", get(handlers::get_notifications))
        // Reports and export
        .route("/reports/monthly-consultations", get(handlers::monthly_consultations_report))
        .route("/reports/patient-growth", get(handlers::patient_growth_report))
        .route("/export/patient/{patient_id}", get(handlers::export_patient))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
