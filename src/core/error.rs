// Centralized error handling for the backend

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use thiserror::Error;
use tracing::error;

use crate::models::auth::MessageResponse;
use crate::models::dataset::ErrorResponse;

/// Errors raised while authenticating a request
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Access denied. No token provided.")]
    MissingToken,

    #[error("Invalid or expired token.")]
    InvalidToken,

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingToken => StatusCode::UNAUTHORIZED,
            AuthError::InvalidToken => StatusCode::BAD_REQUEST,
            AuthError::Signing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the caller
    fn public_message(&self) -> String {
        match self {
            AuthError::Signing(detail) => {
                error!(error = %detail, "Token signing failed");
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (
            self.status(),
            Json(ErrorResponse {
                error: self.public_message(),
            }),
        )
            .into_response()
    }
}

/// Errors from the registration and login flows
#[derive(Error, Debug)]
pub enum AccountError {
    #[error("User already exists")]
    DuplicateUser,

    #[error("User does not exist")]
    NotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid request body: {0}")]
    InvalidRequest(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for AccountError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => AccountError::DuplicateUser,
            other => AccountError::Internal(other.into()),
        }
    }
}

impl From<AuthError> for AccountError {
    fn from(err: AuthError) -> Self {
        AccountError::Internal(err.into())
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let status = match &self {
            AccountError::DuplicateUser
            | AccountError::NotFound
            | AccountError::InvalidCredentials
            | AccountError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AccountError::Internal(e) => {
                error!(error = %e, "Account operation failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (
            status,
            Json(MessageResponse {
                message: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Errors from the credential stores
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store error: {0}")]
    Internal(String),
}

/// Errors produced by the format parsers
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("not a GeoJSON FeatureCollection")]
    NotFeatureCollection,

    #[error("invalid KML: {0}")]
    InvalidXml(String),

    #[error("failed to decode TIFF: {0}")]
    TiffDecode(String),
}

/// Errors that can occur while accepting an upload
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("No file uploaded.")]
    NoFile,

    #[error("Invalid file type. Only GeoJSON, KML, and TIFF files are allowed.")]
    UnsupportedFormat,

    #[error("File too large. Maximum size is {limit} bytes.")]
    PayloadTooLarge { limit: usize },

    #[error("Malformed multipart request: {0}")]
    Multipart(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("An error occurred while uploading and processing the file.")]
    Parse(#[from] ParseError),

    #[error("An error occurred while uploading and processing the file.")]
    Storage(#[from] std::io::Error),

    /// The parse task panicked or was cancelled
    #[error("An error occurred while uploading and processing the file.")]
    Internal(String),
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let status = match &self {
            UploadError::NoFile | UploadError::UnsupportedFormat | UploadError::Multipart(_) => {
                StatusCode::BAD_REQUEST
            }
            UploadError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            UploadError::Auth(inner) => inner.status(),
            UploadError::Parse(e) => {
                error!(error = %e, "Failed to parse uploaded file");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            UploadError::Storage(e) => {
                error!(error = %e, "Failed to store uploaded file");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            UploadError::Internal(detail) => {
                error!(error = %detail, "Upload processing task failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let message = match &self {
            UploadError::Auth(inner) => inner.public_message(),
            other => other.to_string(),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Errors seen by the HTTP client
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status; `message` is the server's `message`/`error` text
    #[error("{message}")]
    Server { status: u16, message: String },
}

impl ClientError {
    /// Text to show inline next to a form
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Server { message, .. } => message.clone(),
            ClientError::Http(e) => e.to_string(),
        }
    }
}
