use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::core::config::{DatabaseConfig, UploadConfig};
use crate::stores::credential_store::{CredentialStore, MemoryCredentialStore};
use crate::stores::pg_credential_store::PgCredentialStore;
use crate::stores::upload_store::UploadStore;
use crate::utils::time::current_timestamp;

// this runs at boot time
pub async fn build_credential_store(config: &DatabaseConfig) -> Result<Arc<dyn CredentialStore>> {
    match &config.url {
        Some(url) => {
            let store = PgCredentialStore::connect(url, config.max_connections)
                .await
                .context("Failed to connect to PostgreSQL")?;

            info!(
                max_connections = config.max_connections,
                "Connected to PostgreSQL credential store"
            );
            Ok(Arc::new(store))
        }
        None => {
            warn!("No DATABASE_URL configured, accounts are kept in memory and lost on restart");
            Ok(Arc::new(MemoryCredentialStore::new()))
        }
    }
}

/// Create the upload directory up front so the first request does not pay for it
pub async fn prepare_upload_dir(uploads: &UploadStore) -> Result<()> {
    uploads
        .ensure_dir()
        .await
        .context(format!(
            "Failed to create upload directory '{}'",
            uploads.dir().display()
        ))?;

    info!(dir = %uploads.dir().display(), "Upload directory ready");
    Ok(())
}

/// Spawn a background task that periodically applies the upload retention policy
pub fn spawn_sweep_task(uploads: Arc<UploadStore>, config: &UploadConfig) {
    let sweep_interval = config.sweep_interval_secs;

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(sweep_interval));

        loop {
            interval.tick().await;

            debug!("Running upload sweep");
            match uploads.sweep(current_timestamp()).await {
                Ok(report) if report.removed_files > 0 => {
                    info!(
                        removed_files = report.removed_files,
                        removed_bytes = report.removed_bytes,
                        remaining_bytes = report.remaining_bytes,
                        "Upload sweep completed"
                    );
                }
                Ok(report) => {
                    debug!(
                        remaining_bytes = report.remaining_bytes,
                        "Upload sweep completed, nothing to remove"
                    );
                }
                Err(e) => {
                    error!(error = %e, "Upload sweep failed");
                }
            }
        }
    });
}
