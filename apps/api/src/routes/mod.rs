pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::matching::handlers;
use crate::state::AppState;

/// Uploads carry dozens of PDFs in one request.
const MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/resumes", post(handlers::handle_score_one))
        .route("/api/v1/resumes/batch", post(handlers::handle_submit_batch))
        .route("/api/v1/match/batch", post(handlers::handle_match_batch))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
