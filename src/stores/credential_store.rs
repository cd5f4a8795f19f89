use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::core::error::StoreError;
use crate::models::user::{NewUser, User};

/// Persistence for user records, keyed by email
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new user. Fails with `DuplicateEmail` if the email is taken,
    /// atomically with respect to concurrent inserts.
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
}

/// In-memory credential store used when no database is configured
pub struct MemoryCredentialStore {
    users: DashMap<String, Arc<User>>,
    next_id: AtomicI64,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        // The entry guard holds the shard lock across check and insert
        match self.users.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateEmail),
            Entry::Vacant(slot) => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let stored = User::new(id, user.username, user.email, user.password_hash);
                slot.insert(Arc::new(stored.clone()));
                Ok(stored)
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(email).map(|entry| User::clone(entry.value())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            username: "mapper".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryCredentialStore::new();
        let user = store.insert(new_user("a@example.com")).await.unwrap();

        let found = store.find_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.username, "mapper");
        assert!(store.find_by_email("b@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryCredentialStore::new();
        store.insert(new_user("a@example.com")).await.unwrap();

        let second = store.insert(new_user("a@example.com")).await;
        assert!(matches!(second, Err(StoreError::DuplicateEmail)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let store = MemoryCredentialStore::new();
        let a = store.insert(new_user("a@example.com")).await.unwrap();
        let b = store.insert(new_user("b@example.com")).await.unwrap();

        assert_ne!(a.id, b.id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_duplicate_inserts() {
        let store = Arc::new(MemoryCredentialStore::new());

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.insert(new_user("race@example.com")).await.is_ok()
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(store.len(), 1);
    }
}
