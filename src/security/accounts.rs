// Registration and login flows

use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::error::AccountError;
use crate::core::state::AppState;
use crate::models::auth::{LoginRequest, RegisterRequest};
use crate::models::user::NewUser;

/// Create a user and issue a session token for it
pub async fn register(state: &AppState, request: RegisterRequest) -> Result<String, AccountError> {
    if state.credentials.find_by_email(&request.email).await?.is_some() {
        warn!(email = %request.email, "Registration for existing email");
        return Err(AccountError::DuplicateUser);
    }

    let hasher = Arc::clone(&state.hasher);
    let password = request.password;
    let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .context("Password hashing task failed")??;

    // The store re-checks uniqueness atomically, a concurrent registration
    // that slipped past the lookup above still ends up as DuplicateUser
    let user = state
        .credentials
        .insert(NewUser {
            username: request.username,
            email: request.email,
            password_hash,
        })
        .await?;

    let token = state.tokens.issue(user.id)?;

    info!(user_id = user.id, username = %user.username, "User registered");

    Ok(token)
}

/// Check credentials and issue a session token
pub async fn login(state: &AppState, request: LoginRequest) -> Result<String, AccountError> {
    let user = match state.credentials.find_by_email(&request.email).await? {
        Some(user) => user,
        None => {
            warn!(email = %request.email, "Login for unknown email");
            return Err(AccountError::NotFound);
        }
    };

    let hasher = Arc::clone(&state.hasher);
    let password = request.password;
    let stored_hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || hasher.verify(&password, &stored_hash))
        .await
        .context("Password verification task failed")??;

    if !matches {
        warn!(user_id = user.id, "Login with invalid credentials");
        return Err(AccountError::InvalidCredentials);
    }

    let token = state.tokens.issue(user.id)?;

    info!(user_id = user.id, "User logged in");

    Ok(token)
}
