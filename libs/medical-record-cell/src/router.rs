use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn medical_record_routes(state: Arc<AppState>) -> Router {
    let public_routes = Router::new().route("/access", post(handlers::access_by_record_code));

    let protected_routes = Router::new()
        .route("/fingerprint/search", post(handlers::access_by_fingerprint))
        .route("/{medical_record_id}", put(handlers::update_medical_record))
        .route(
            "/{medical_record_id}/consultations",
            get(handlers::get_record_consultations).post(handlers::add_consultation),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
