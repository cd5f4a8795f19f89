#[derive(Clone, Debug)]
pub struct User {
    /// Database-assigned user ID
    pub id: i64,
    pub username: String,
    /// Unique across all users
    pub email: String,
    /// Argon2 PHC string, never the plaintext
    pub password_hash: String,
}

impl User {
    pub fn new(id: i64, username: String, email: String, password_hash: String) -> Self {
        Self {
            id,
            username,
            email,
            password_hash,
        }
    }
}

/// A user that has not been persisted yet
#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}
