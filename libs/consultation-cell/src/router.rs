use std::sync::Arc;

use axum::{middleware, routing::get, Router};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn consultation_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/{consultation_id}",
            get(handlers::get_consultation)
                .put(handlers::update_consultation)
                .delete(handlers::delete_consultation),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}
