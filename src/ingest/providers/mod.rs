// src/ingest/providers/mod.rs
pub mod telegram_http;

pub use telegram_http::{Credentials, HttpSession, HttpSessionSettings};
