// Application state (AppState)

use anyhow::Result;
use std::sync::Arc;

use crate::core::config::Config;
use crate::parsers::ParseOptions;
use crate::security::password::PasswordHasher;
use crate::security::token::TokenIssuer;
use crate::stores::credential_store::CredentialStore;
use crate::stores::upload_store::UploadStore;

/// Shared application state
///
/// Everything a request handler needs. Shared through `Arc<AppState>`.
#[derive(Clone)]
pub struct AppState {
    /// User records (PostgreSQL or in-memory)
    pub credentials: Arc<dyn CredentialStore>,

    /// Session token issuer/verifier
    pub tokens: Arc<TokenIssuer>,

    pub hasher: Arc<PasswordHasher>,

    /// Raw upload storage
    pub uploads: Arc<UploadStore>,

    pub parse_options: ParseOptions,

    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, credentials: Arc<dyn CredentialStore>) -> Result<Self> {
        let hasher = PasswordHasher::from_config(&config.auth)?;
        let tokens = TokenIssuer::new(&config.auth.jwt_secret, config.auth.token_ttl_secs);
        let uploads = UploadStore::from_config(&config.uploads);
        let parse_options = ParseOptions {
            strict_geojson: config.uploads.strict_geojson,
        };

        Ok(Self {
            credentials,
            tokens: Arc::new(tokens),
            hasher: Arc::new(hasher),
            uploads: Arc::new(uploads),
            parse_options,
            config: Arc::new(config),
        })
    }
}

#[cfg(test)]
pub(crate) fn test_config(upload_dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.auth.jwt_secret = "test-secret".to_string();
    // Minimum Argon2 cost keeps the suites fast
    config.auth.argon2_memory_kib = 1024;
    config.auth.argon2_iterations = 1;
    config.uploads.dir = upload_dir.to_path_buf();
    config
}

/// State backed by the in-memory store and a temporary upload directory.
/// Keep the `TempDir` alive for as long as the state is used.
#[cfg(test)]
pub(crate) fn test_state() -> (AppState, tempfile::TempDir) {
    test_state_with(|_| {})
}

#[cfg(test)]
pub(crate) fn test_state_with<F>(customize: F) -> (AppState, tempfile::TempDir)
where
    F: FnOnce(&mut Config),
{
    use crate::stores::credential_store::MemoryCredentialStore;

    let temp_dir = tempfile::TempDir::new().unwrap();
    let mut config = test_config(&temp_dir.path().join("uploads"));
    customize(&mut config);

    let state = AppState::new(config, Arc::new(MemoryCredentialStore::new())).unwrap();
    (state, temp_dir)
}
