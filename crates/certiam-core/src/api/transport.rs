//! Transport seam between the pipeline and the network.
//!
//! `HttpTransport` sends prepared requests with reqwest. Any HTTP status is
//! returned as a `RawResponse`; only failures where no response exists, or
//! whose body could not be read, are reported as `TransportError`.

use std::time::Duration;

use anyhow::Result;
use futures::future::BoxFuture;
use reqwest::header::CONTENT_TYPE;
use reqwest::{multipart, Client};
use thiserror::Error;
use tracing::{debug, warn};

use super::envelope::{Body, Method, RequestEnvelope};
use super::query;

/// A completed HTTP exchange, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// A response arrived with an error status.
    #[error("Server responded with status {status}")]
    Status { status: u16, body: Vec<u8> },

    /// The request was sent but no response came back.
    #[error("No response: {0}")]
    NoResponse(String),

    /// The request could not be built or sent at all.
    #[error("{0}")]
    Local(String),
}

pub trait Transport: Send + Sync {
    fn send(&self, request: RequestEnvelope) -> BoxFuture<'_, Result<RawResponse, TransportError>>;
}

/// reqwest-backed transport.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve a request path against the base URL. Absolute URLs are used as-is.
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') {
            format!("{}{}", self.base_url, url)
        } else {
            format!("{}/{}", self.base_url, url)
        }
    }

    async fn dispatch(&self, mut request: RequestEnvelope) -> Result<RawResponse, TransportError> {
        // Params left on non-read requests still travel in the query string.
        let query = query::build_read_query(&request.params);
        let url = query::append_query(&self.resolve_url(&request.url), &query);

        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let builder = match std::mem::take(&mut request.body) {
            Body::Empty => self.client.request(method, &url).headers(request.headers),
            Body::Json(value) => self
                .client
                .request(method, &url)
                .headers(request.headers)
                .json(&value),
            Body::UrlEncoded(text) => self
                .client
                .request(method, &url)
                .headers(request.headers)
                .body(text),
            Body::Multipart(fields) => {
                // reqwest writes its own content type with the boundary
                request.headers.remove(CONTENT_TYPE);
                let form = fields
                    .into_iter()
                    .fold(multipart::Form::new(), |form, field| form.text(field.name, field.value));
                self.client
                    .request(method, &url)
                    .headers(request.headers)
                    .multipart(form)
            }
        };

        let response = builder.send().await.map_err(classify_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| unreadable_body(status, e))?;
        debug!(url = %url, status, bytes = body.len(), "Response received");

        Ok(RawResponse {
            status,
            body: body.to_vec(),
        })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: RequestEnvelope) -> BoxFuture<'_, Result<RawResponse, TransportError>> {
        Box::pin(self.dispatch(request))
    }
}

/// A status line arrived but the body did not; keep the status so the
/// error path can still report it.
fn unreadable_body(status: u16, detail: impl std::fmt::Display) -> TransportError {
    warn!(status, error = %detail, "Failed to read response body");
    TransportError::Status {
        status,
        body: Vec::new(),
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_builder() {
        TransportError::Local(e.to_string())
    } else {
        TransportError::NoResponse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_body_keeps_status() {
        assert_eq!(
            unreadable_body(502, "connection reset"),
            TransportError::Status {
                status: 502,
                body: Vec::new(),
            }
        );
    }

    #[test]
    fn test_resolve_url() {
        let transport = HttpTransport::new("https://iam.example.com/", Duration::from_secs(5))
            .expect("client should build");
        assert_eq!(
            transport.resolve_url("/apis/v1/certs"),
            "https://iam.example.com/apis/v1/certs"
        );
        assert_eq!(
            transport.resolve_url("api/v1/iam/roles"),
            "https://iam.example.com/api/v1/iam/roles"
        );
        assert_eq!(
            transport.resolve_url("https://other.example.com/x"),
            "https://other.example.com/x"
        );
    }
}
