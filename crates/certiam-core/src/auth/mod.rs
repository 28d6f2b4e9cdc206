//! Session management and credential storage.
//!
//! This module provides:
//! - `Session`: the in-memory session store (token, current user, permitted
//!   routes), persisted to disk between runs
//! - `CredentialStore`: OS keychain storage for a remembered bearer token

pub mod credentials;
pub mod session;

pub use credentials::CredentialStore;
pub use session::{LoginInfo, SharedSession, Session, SessionState, UserInfo};
