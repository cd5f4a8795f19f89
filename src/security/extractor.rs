use axum::{extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use std::sync::Arc;

use crate::core::error::AuthError;
use crate::core::state::AppState;

/// Identity of the caller, taken from `Authorization: Bearer <token>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i64,
}

/// Token part of an Authorization header value
pub fn bearer_token(value: &str) -> &str {
    value.strip_prefix("Bearer ").unwrap_or(value).trim()
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(bearer_token);

        let user_id = state.tokens.verify(token)?;
        Ok(AuthUser { user_id })
    }
}
