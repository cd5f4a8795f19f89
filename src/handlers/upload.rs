use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::error::UploadError;
use crate::core::state::AppState;
use crate::models::dataset::{Dataset, UploadResponse};
use crate::parsers::UploadFormat;
use crate::security::extractor::AuthUser;
use crate::utils::time::current_timestamp_millis;

pub const UPLOAD_FIELD: &str = "file";

fn multipart_error(err: MultipartError, limit: usize) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::PayloadTooLarge { limit }
    } else {
        UploadError::Multipart(err.body_text())
    }
}

/// Collect a part's bytes, failing as soon as it grows past `limit`
async fn read_limited(mut field: Field<'_>, limit: usize) -> Result<Vec<u8>, UploadError> {
    let mut bytes = Vec::new();

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if bytes.len() + chunk.len() > limit {
            return Err(UploadError::PayloadTooLarge { limit });
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

/// Upload a single geospatial file
///
/// POST /api/files/upload (multipart field `file`, Authorization: Bearer <token>)
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, UploadError> {
    let mut multipart = multipart.map_err(|e| UploadError::Multipart(e.body_text()))?;
    let limit = state.config.uploads.max_file_size;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(UploadError::NoFile),
        };

        // Type check happens before a single byte of the body is read
        let Some(format) = UploadFormat::from_file_name(&file_name) else {
            warn!(user_id = user.user_id, file_name = %file_name, "Rejected upload with unsupported type");
            return Err(UploadError::UnsupportedFormat);
        };

        let bytes = match read_limited(field, limit).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(user_id = user.user_id, file_name = %file_name, error = %e, "Rejected upload");
                return Err(e);
            }
        };

        let uploaded_at = current_timestamp_millis();
        let path = state.uploads.store(&file_name, &bytes, uploaded_at).await?;

        let byte_count = bytes.len();
        let parse_options = state.parse_options;
        let parsed = tokio::task::spawn_blocking(move || format.parse(&bytes, &parse_options))
            .await
            .map_err(|e| UploadError::Internal(e.to_string()))
            .and_then(|result| result.map_err(UploadError::from));

        let data = match parsed {
            Ok(data) => data,
            Err(e) => {
                // Nothing references the raw file once parsing failed
                if let Err(remove_err) = state.uploads.remove(&path).await {
                    warn!(path = %path.display(), error = %remove_err, "Failed to remove unparsable upload");
                }
                return Err(e);
            }
        };

        info!(
            user_id = user.user_id,
            file_name = %file_name,
            format = %format,
            bytes = byte_count,
            path = %path.display(),
            "File uploaded and processed"
        );

        let dataset = Dataset::new(uploaded_at.to_string(), data);

        return Ok((
            StatusCode::OK,
            Json(UploadResponse {
                message: "File uploaded and processed successfully".to_string(),
                dataset,
            }),
        )
            .into_response());
    }

    Err(UploadError::NoFile)
}
