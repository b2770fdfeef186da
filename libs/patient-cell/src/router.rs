use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn patient_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", post(handlers::create_patient).get(handlers::list_patients))
        .route("/search", get(handlers::search_patients))
        .route("/search/fingerprint", post(handlers::search_by_fingerprint))
        .route("/{patient_id}", get(handlers::get_patient))
        .route("/{patient_id}/fingerprint", post(handlers::enroll_fingerprint))
        .route("/{patient_id}/consultations", get(handlers::get_patient_consultations))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
