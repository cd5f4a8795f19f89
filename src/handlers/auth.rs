use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

use crate::core::error::AccountError;
use crate::core::state::AppState;
use crate::models::auth::{LoginRequest, RegisterRequest, TokenResponse};
use crate::security::accounts;

/// Register a user
///
/// POST /api/auth/register {username, email, password}
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Response, AccountError> {
    let Json(request) = payload.map_err(|e| AccountError::InvalidRequest(e.body_text()))?;

    let token = accounts::register(&state, request).await?;

    Ok((StatusCode::CREATED, Json(TokenResponse { token })).into_response())
}

/// Log a user in
///
/// POST /api/auth/login {email, password}
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AccountError> {
    let Json(request) = payload.map_err(|e| AccountError::InvalidRequest(e.body_text()))?;

    let token = accounts::login(&state, request).await?;

    Ok((StatusCode::OK, Json(TokenResponse { token })).into_response())
}
