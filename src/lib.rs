pub mod client;
pub mod core;
pub mod handlers;
pub mod models;
pub mod parsers;
pub mod security;
pub mod stores;
pub mod utils;
