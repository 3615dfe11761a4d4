//! Portfolio site backend.
//!
//! - `http`: axum API for site content, the admin panel and translation files
//! - `i18n`: translation loading, optimization, caching and validation
//! - `store`: PostgreSQL and in-memory persistence
//! - `mailer`: SMTP notifications

pub mod config;
pub mod http;
pub mod i18n;
pub mod logging;
pub mod mailer;
pub mod models;
pub mod retry;
pub mod security;
pub mod store;
