//! REST API client module for the certificate and IAM backend.
//!
//! This module provides the request pipeline (interceptors), the transport
//! seam, and the `ApiClient` with one wrapper per backend endpoint.
//!
//! Every response follows the `{ code, data, message }` envelope and every
//! authenticated call carries an `Authorization: Bearer <token>` header.

pub mod certs;
pub mod client;
pub mod envelope;
pub mod error;
pub mod group;
pub mod permission;
pub mod pipeline;
pub mod query;
pub mod role;
pub mod transport;
pub mod user;

pub use certs::CertOverview;
pub use client::ApiClient;
pub use envelope::{Body, Envelope, Method, MultipartField, RequestEnvelope, ResponseType};
pub use error::ApiError;
pub use pipeline::{LogNotifier, Notifier, PipelineOptions, RequestContext, ResetHook, ResponsePayload};
pub use transport::{HttpTransport, RawResponse, Transport, TransportError};
