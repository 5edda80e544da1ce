pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::applications::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Applications API
        .route("/api/apply", post(handlers::handle_apply))
        .route("/api/application", get(handlers::handle_list_applications))
        .route("/api/my_applicants", get(handlers::handle_my_applicants))
        .route("/api/applications/me", get(handlers::handle_my_applications))
        .route(
            "/api/applications/aggregation_data",
            get(handlers::handle_aggregation_data),
        )
        .route(
            "/api/delete_application",
            delete(handlers::handle_delete_application),
        )
        .route(
            "/api/application/resume/:application_id",
            get(handlers::handle_get_resume),
        )
        .route(
            "/api/application/cover_letter/:application_id",
            get(handlers::handle_get_cover_letter),
        )
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}
