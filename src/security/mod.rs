pub mod accounts;
pub mod extractor;
pub mod password;
pub mod token;
