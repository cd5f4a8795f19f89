use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::core::error::ClientError;
use crate::models::auth::{LoginRequest, RegisterRequest, TokenResponse};
use crate::models::dataset::{Dataset, UploadResponse};

/// HTTP client for the geo backend
#[derive(Clone)]
pub struct GeoClient {
    client: reqwest::Client,
    base_url: String,
}

/// Either error body shape the backend produces
#[derive(Debug, Deserialize)]
struct ServerErrorBody {
    message: Option<String>,
    error: Option<String>,
}

impl GeoClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn a non-success response into `ClientError::Server`
    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ServerErrorBody>(&body)
            .ok()
            .and_then(|b| b.message.or(b.error))
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("Request failed")
                    .to_string()
            });

        debug!(status = status.as_u16(), message = %message, "Server returned an error");

        Err(ClientError::Server {
            status: status.as_u16(),
            message,
        })
    }

    /// GET / and return the liveness text
    pub async fn health(&self) -> Result<String, ClientError> {
        let response = self.client.get(self.url("/")).send().await?;
        Ok(Self::check(response).await?.text().await?)
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<String, ClientError> {
        let request = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&request)
            .send()
            .await?;

        let body: TokenResponse = Self::check(response).await?.json().await?;
        Ok(body.token)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String, ClientError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&request)
            .send()
            .await?;

        let body: TokenResponse = Self::check(response).await?.json().await?;
        Ok(body.token)
    }

    /// Upload one file as the multipart field `file`
    pub async fn upload(
        &self,
        token: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Dataset, ClientError> {
        let part = Part::bytes(bytes).file_name(file_name.to_string());
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.url("/api/files/upload"))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;

        let body: UploadResponse = Self::check(response).await?.json().await?;
        Ok(body.dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = GeoClient::new("http://localhost:3001/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:3001");
        assert_eq!(client.url("/api/auth/login"), "http://localhost:3001/api/auth/login");
    }

    #[test]
    fn test_error_body_shapes() {
        let body: ServerErrorBody = serde_json::from_str(r#"{"message": "Invalid credentials"}"#).unwrap();
        assert_eq!(body.message.as_deref(), Some("Invalid credentials"));

        let body: ServerErrorBody = serde_json::from_str(r#"{"error": "No file uploaded."}"#).unwrap();
        assert_eq!(body.error.as_deref(), Some("No file uploaded."));
    }
}
