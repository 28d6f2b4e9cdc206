//! certiam-core - client library for the certificate and IAM administration backend.
//!
//! The pieces:
//! - `api`: request pipeline (interceptors), transport, `ApiClient` and the
//!   per-entity endpoint wrappers
//! - `models`: typed request/response records for certificates and IAM entities
//! - `auth`: session store and OS-keychain token storage
//! - `routes`: permission-driven route set, navigation guard and menu derivation
//! - `host`: micro-frontend lifecycle (bootstrap/mount/unmount/update)
//! - `config`: persisted configuration with environment overrides

pub mod api;
pub mod auth;
pub mod config;
pub mod host;
pub mod models;
pub mod routes;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{Session, SessionState};
pub use config::Config;
