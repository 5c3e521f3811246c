//! HTTP API: server, routing, and request/response mapping.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;
pub mod validate;

pub use app::{StartupError, build_app, router};
pub use config::{ApiConfig, ConfigError};
