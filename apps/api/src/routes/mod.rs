pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::matching::handlers;
use crate::state::AppState;

/// Uploads carry whole PDFs, well past axum's 2 MB default.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/analyze",
            post(handlers::handle_analyze).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .with_state(state)
}
