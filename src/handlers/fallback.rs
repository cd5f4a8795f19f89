use axum::{
    http::{StatusCode, Uri},
    response::{IntoResponse, Json, Response},
};
use tracing::debug;

use crate::models::dataset::ErrorResponse;

pub async fn fallback_handler(uri: Uri) -> Response {
    debug!(path = %uri.path(), "No route matched");

    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("No route for {}", uri.path()),
        }),
    )
        .into_response()
}
