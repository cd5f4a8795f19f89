//! Login, signup and upload forms. Each keeps the text it would show
//! inline and talks to the backend through [`GeoClient`].

use tracing::{info, warn};

use super::api::GeoClient;
use super::session::SessionContext;
use crate::models::dataset::Dataset;

pub const SELECT_FILE_MESSAGE: &str = "Please select a file to upload";
pub const LOGIN_REQUIRED_MESSAGE: &str = "You must be logged in to upload files";
pub const UPLOAD_SUCCESS_MESSAGE: &str = "File uploaded successfully!";
pub const UPLOAD_FAILED_MESSAGE: &str = "Error uploading file";

/// Store a fresh token or keep the failure as the form's error text
fn finish_auth(
    session: &mut SessionContext,
    result: Result<String, crate::core::error::ClientError>,
    error: &mut Option<String>,
) -> bool {
    let outcome = result
        .map_err(|e| e.user_message())
        .and_then(|token| session.sign_in(token).map_err(|e| e.to_string()));

    match outcome {
        Ok(()) => {
            *error = None;
            true
        }
        Err(message) => {
            *error = Some(message);
            false
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub error: Option<String>,
}

impl LoginForm {
    /// Returns true once the session is signed in
    pub async fn submit(&mut self, client: &GeoClient, session: &mut SessionContext) -> bool {
        let result = client.login(&self.email, &self.password).await;
        finish_auth(session, result, &mut self.error)
    }
}

#[derive(Debug, Default, Clone)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub error: Option<String>,
}

impl SignupForm {
    pub async fn submit(&mut self, client: &GeoClient, session: &mut SessionContext) -> bool {
        let result = client
            .register(&self.username, &self.email, &self.password)
            .await;
        finish_auth(session, result, &mut self.error)
    }
}

#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default, Clone)]
pub struct UploadForm {
    pub file: Option<SelectedFile>,
    pub message: Option<String>,
}

impl UploadForm {
    pub fn select(&mut self, name: impl Into<String>, bytes: Vec<u8>) {
        self.file = Some(SelectedFile {
            name: name.into(),
            bytes,
        });
    }

    /// Upload the selected file and append the dataset to the session
    pub async fn submit(
        &mut self,
        client: &GeoClient,
        session: &mut SessionContext,
    ) -> Option<Dataset> {
        let Some(file) = &self.file else {
            self.message = Some(SELECT_FILE_MESSAGE.to_string());
            return None;
        };

        let Some(token) = session.token() else {
            self.message = Some(LOGIN_REQUIRED_MESSAGE.to_string());
            return None;
        };

        match client.upload(token, &file.name, file.bytes.clone()).await {
            Ok(dataset) => {
                info!(dataset_id = %dataset.id, file_name = %file.name, "Dataset received");
                session.add_dataset(dataset.clone());
                self.message = Some(UPLOAD_SUCCESS_MESSAGE.to_string());
                Some(dataset)
            }
            Err(e) => {
                warn!(file_name = %file.name, error = %e, "Upload failed");
                self.message = Some(UPLOAD_FAILED_MESSAGE.to_string());
                None
            }
        }
    }
}
