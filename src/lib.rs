//! Admission gate: token authentication, permission checks, per-client rate
//! limiting and image captchas in front of an HTTP API.

pub mod admin;
pub mod auth;
pub mod captcha;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod permission;
pub mod security;

pub use config::schema::GateConfig;
pub use error::GateError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
