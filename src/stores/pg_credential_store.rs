use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use std::time::Duration;

use super::credential_store::CredentialStore;
use crate::core::error::StoreError;
use crate::models::user::{NewUser, User};

const CREATE_USERS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        username TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password TEXT NOT NULL
    )
"#;

#[derive(FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User::new(row.id, row.username, row.email, row.password)
    }
}

/// PostgreSQL-backed credential store
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    /// Connect and make sure the `users` table exists
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_USERS_TABLE).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, email, password)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return StoreError::DuplicateEmail;
                }
            }
            StoreError::Database(e)
        })?;

        Ok(row.into())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, username, email, password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(User::from))
    }
}
