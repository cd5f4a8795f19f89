// HTTP routes configuration

use crate::core::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Room for multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn build_router(state: Arc<AppState>) -> Router {
    let upload_body_limit = state.config.uploads.max_file_size + MULTIPART_OVERHEAD;

    Router::new()
        // Liveness
        .route("/", get(crate::handlers::health::liveness_handler))

        // Accounts
        .route("/api/auth/register", post(crate::handlers::auth::register_handler))
        .route("/api/auth/login", post(crate::handlers::auth::login_handler))

        // Uploads (require a bearer token)
        .route(
            "/api/files/upload",
            post(crate::handlers::upload::upload_handler)
                .layer(DefaultBodyLimit::max(upload_body_limit)),
        )

        // 404 fallback for all unmatched routes
        .fallback(crate::handlers::fallback::fallback_handler)

        .layer(CorsLayer::permissive())
        .with_state(state)
}
