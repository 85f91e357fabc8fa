pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/resumes",
            post(handlers::handle_submit_resume).get(handlers::handle_list_resumes),
        )
        .route("/api/v1/resumes/:id", get(handlers::handle_get_resume))
        .route("/api/v1/files/*path", get(handlers::handle_get_file))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}
