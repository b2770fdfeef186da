use std::sync::Arc;

use axum::{routing::post, Router};

use shared_database::AppState;

use crate::handlers;

pub fn auth_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/register/doctor", post(handlers::register_doctor))
        .route("/login/doctor", post(handlers::login_doctor))
        .route("/validate", post(handlers::validate_session))
        .route("/verify", post(handlers::verify_session))
        .with_state(state)
}
