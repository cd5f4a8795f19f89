pub mod credential_store;
pub mod pg_credential_store;
pub mod upload_store;
