//! API client for the certificate and IAM backend.
//!
//! `ApiClient` runs every call through the interceptor pipeline and decodes
//! the unwrapped `data` into typed records. The endpoint wrappers live in
//! the sibling modules (`certs`, `permission`, `role`, `user`, `group`).

use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::envelope::RequestEnvelope;
use super::pipeline::{self, PipelineOptions, RequestContext, ResponsePayload};
use super::transport::{HttpTransport, Transport};
use super::ApiError;
use crate::config::Config;

/// API client for the administration backend.
/// Clone is cheap - the transport is shared behind an Arc.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    options: PipelineOptions,
    context: RequestContext,
}

impl ApiClient {
    /// Create a client that talks HTTP to the configured backend.
    pub fn new(config: &Config) -> Result<Self> {
        let transport = HttpTransport::new(&config.base_url, config.request_timeout())
            .context("Failed to build HTTP client")?;
        Ok(Self::with_transport(Arc::new(transport), config.pipeline_options()))
    }

    pub fn with_transport(transport: Arc<dyn Transport>, options: PipelineOptions) -> Self {
        Self {
            transport,
            options,
            context: RequestContext::default(),
        }
    }

    /// Create a new ApiClient with the given context, sharing the transport.
    pub fn with_context(&self, context: RequestContext) -> Self {
        Self {
            transport: self.transport.clone(),
            options: self.options,
            context,
        }
    }

    /// Run one request through the pipeline.
    pub async fn execute(&self, mut request: RequestEnvelope) -> Result<ResponsePayload, ApiError> {
        pipeline::intercept_request(&mut request, &self.context, &self.options);
        let response_type = request.response_type;
        match self.transport.send(request).await {
            Ok(response) => {
                pipeline::intercept_response(response, response_type, &self.context, &self.options)
            }
            Err(e) => Err(pipeline::intercept_error(e, &self.context)),
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestEnvelope) -> Result<T> {
        let label = format!("{} {}", request.method, request.url);
        let data = match self.execute(request).await? {
            ResponsePayload::Data(data) => data,
            ResponsePayload::Blob(_) => {
                return Err(ApiError::InvalidResponse(format!(
                    "Expected JSON envelope from {}, got binary stream",
                    label
                ))
                .into())
            }
        };
        serde_json::from_value(data)
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
            .with_context(|| format!("Failed to parse response data from {}", label))
    }

    pub(crate) async fn get<T: DeserializeOwned, Q: Serialize + ?Sized>(&self, url: &str, query: &Q) -> Result<T> {
        let params = to_params(query)?;
        self.send_json(RequestEnvelope::get(url).params(params)).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<T> {
        self.send_json(RequestEnvelope::post(url).json(to_body(body)?)).await
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<T> {
        self.send_json(RequestEnvelope::put(url).json(to_body(body)?)).await
    }

    pub(crate) async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(&self, url: &str, body: &B) -> Result<T> {
        self.send_json(RequestEnvelope::patch(url).json(to_body(body)?)).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.send_json(RequestEnvelope::delete(url)).await
    }

    /// DELETE carrying a JSON body (batch deletes).
    pub(crate) async fn delete_with_body<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        self.send_json(RequestEnvelope::delete(url).json(to_body(body)?)).await
    }

    /// Fetch a binary stream; the envelope is not unwrapped.
    pub async fn download<Q: Serialize + ?Sized>(&self, url: &str, query: &Q) -> Result<Vec<u8>> {
        let params = to_params(query)?;
        match self.execute(RequestEnvelope::get(url).params(params).blob()).await? {
            ResponsePayload::Blob(bytes) => {
                debug!(url, bytes = bytes.len(), "Download complete");
                Ok(bytes)
            }
            ResponsePayload::Data(_) => Err(ApiError::InvalidResponse(format!(
                "Expected binary stream from {}",
                url
            ))
            .into()),
        }
    }
}

/// Serialize a query record into request params. Unit `()` means no params.
fn to_params<Q: Serialize + ?Sized>(query: &Q) -> Result<Map<String, Value>> {
    match serde_json::to_value(query).context("Failed to serialize query parameters")? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Map::new()),
        other => Err(ApiError::Request(format!(
            "Query parameters must be an object, got {}",
            other
        ))
        .into()),
    }
}

fn to_body<B: Serialize + ?Sized>(body: &B) -> Result<Value> {
    serde_json::to_value(body).context("Failed to serialize request body")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_params_accepts_unit_and_objects() {
        assert!(to_params(&()).unwrap().is_empty());
        let params = to_params(&json!({"page": 1})).unwrap();
        assert_eq!(params.get("page"), Some(&json!(1)));
    }

    #[test]
    fn test_to_params_rejects_scalars() {
        let err = to_params(&json!([1, 2])).unwrap_err();
        assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::Request(_))));
    }
}
