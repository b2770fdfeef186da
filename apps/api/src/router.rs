use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::json;

use auth_cell::router::auth_routes;
use consultation_cell::router::consultation_routes;
use doctor_cell::router::doctor_routes;
use medical_record_cell::router::medical_record_routes;
use patient_cell::router::patient_routes;
use shared_database::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Medical records API is running!" }))
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/doctors", doctor_routes(state.clone()))
        .nest("/patients", patient_routes(state.clone()))
        .nest("/medical-records", medical_record_routes(state.clone()))
        .nest("/consultations", consultation_routes(state))
}
