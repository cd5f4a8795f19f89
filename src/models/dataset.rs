use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parsed upload content handed back to the client for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Upload time in milliseconds since the epoch
    pub id: String,
    pub data: Value,
}

impl Dataset {
    pub fn new(id: String, data: Value) -> Self {
        Self { id, data }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub dataset: Dataset,
}

/// Error body used by the upload endpoint and the fallback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
