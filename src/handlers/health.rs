use axum::{http::StatusCode, response::IntoResponse};

pub const LIVENESS_MESSAGE: &str = "GeoBackend API is working";

/// Liveness check
///
/// GET /
pub async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, LIVENESS_MESSAGE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_liveness_handler() {
        let response = liveness_handler().await.into_response();

        let (parts, body) = response.into_parts();
        assert_eq!(parts.status, StatusCode::OK);
        assert!(parts.headers["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));

        let bytes = Body::new(body).collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], LIVENESS_MESSAGE.as_bytes());
    }
}
