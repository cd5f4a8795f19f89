//! Client session shell.
//!
//! Holds what the signed-in UI needs: the session token (persisted through
//! an injected [`TokenStorage`]), which auth form is showing, and the
//! datasets uploaded during this session.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

use crate::models::dataset::Dataset;

/// Where the session token survives between runs
pub trait TokenStorage: Send + Sync {
    fn get(&self) -> Option<String>;
    fn set(&self, token: &str) -> std::io::Result<()>;
    fn clear(&self) -> std::io::Result<()>;
}

/// Token storage that lives only as long as the process
#[derive(Default)]
pub struct MemoryTokenStorage {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn get(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn set(&self, token: &str) -> std::io::Result<()> {
        *self
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> std::io::Result<()> {
        *self
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        Ok(())
    }
}

/// Token kept in a single file
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStorage for FileTokenStorage {
    fn get(&self) -> Option<String> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                (!token.is_empty()).then(|| token.to_string())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read stored token");
                None
            }
        }
    }

    fn set(&self, token: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, token)
    }

    fn clear(&self) -> std::io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthForm {
    Login,
    Signup,
}

/// Top-level screen to render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Auth(AuthForm),
    Main,
}

pub struct SessionContext {
    storage: Arc<dyn TokenStorage>,
    token: Option<String>,
    form: AuthForm,
    datasets: Vec<Dataset>,
}

impl SessionContext {
    /// Start a session, picking up a token left by a previous run
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        let token = storage.get();
        Self {
            storage,
            token,
            form: AuthForm::Login,
            datasets: Vec::new(),
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }

    pub fn sign_in(&mut self, token: String) -> std::io::Result<()> {
        self.storage.set(&token)?;
        self.token = Some(token);
        info!("Signed in");
        Ok(())
    }

    pub fn sign_out(&mut self) -> std::io::Result<()> {
        self.storage.clear()?;
        self.token = None;
        self.datasets.clear();
        info!("Signed out");
        Ok(())
    }

    pub fn form(&self) -> AuthForm {
        self.form
    }

    pub fn toggle_form(&mut self) {
        self.form = match self.form {
            AuthForm::Login => AuthForm::Signup,
            AuthForm::Signup => AuthForm::Login,
        };
    }

    pub fn add_dataset(&mut self, dataset: Dataset) {
        self.datasets.push(dataset);
    }

    pub fn datasets(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn view(&self) -> View {
        if self.is_signed_in() {
            View::Main
        } else {
            View::Auth(self.form)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_routing_follows_token() {
        let mut session = SessionContext::new(Arc::new(MemoryTokenStorage::new()));
        assert_eq!(session.view(), View::Auth(AuthForm::Login));

        session.toggle_form();
        assert_eq!(session.view(), View::Auth(AuthForm::Signup));
        session.toggle_form();
        assert_eq!(session.view(), View::Auth(AuthForm::Login));

        session.sign_in("abc".to_string()).unwrap();
        assert_eq!(session.view(), View::Main);
        assert_eq!(session.token(), Some("abc"));

        session.sign_out().unwrap();
        assert_eq!(session.view(), View::Auth(AuthForm::Login));
    }

    #[test]
    fn test_datasets_append_in_order() {
        let mut session = SessionContext::new(Arc::new(MemoryTokenStorage::new()));
        session.add_dataset(Dataset::new("1".to_string(), json!({})));
        session.add_dataset(Dataset::new("2".to_string(), json!({})));

        let ids: Vec<&str> = session.datasets().iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_file_storage_survives_restart() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session").join("token");

        let mut session = SessionContext::new(Arc::new(FileTokenStorage::new(&path)));
        session.sign_in("persisted".to_string()).unwrap();

        let restored = SessionContext::new(Arc::new(FileTokenStorage::new(&path)));
        assert_eq!(restored.token(), Some("persisted"));
        assert_eq!(restored.view(), View::Main);
    }

    #[test]
    fn test_file_storage_clear() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileTokenStorage::new(temp_dir.path().join("token"));

        assert!(storage.clear().is_ok());
        storage.set("abc").unwrap();
        assert_eq!(storage.get().as_deref(), Some("abc"));
        storage.clear().unwrap();
        assert!(storage.get().is_none());
    }
}
