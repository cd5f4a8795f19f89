use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::core::error::AuthError;
use crate::utils::time::current_timestamp;

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "userId")]
    pub user_id: i64,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 session tokens
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_secs: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is exact, no grace period
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Issue a token for a user, valid for the configured lifetime
    pub fn issue(&self, user_id: i64) -> Result<String, AuthError> {
        self.issue_at(user_id, current_timestamp())
    }

    /// Issue a token as if it had been created at `issued_at`
    pub fn issue_at(&self, user_id: i64, issued_at: i64) -> Result<String, AuthError> {
        let claims = Claims {
            user_id,
            iat: issued_at,
            exp: issued_at + self.ttl_secs,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify a token and return the user it was issued for
    pub fn verify(&self, token: Option<&str>) -> Result<i64, AuthError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims.user_id)
            .map_err(|_| AuthError::InvalidToken)
    }
}
