//! Request/response interceptors.
//!
//! Every call made through `ApiClient` goes through three stages:
//!
//! 1. [`intercept_request`] rewrites the outgoing descriptor (bearer token,
//!    read query serialization, form and multipart body encoding).
//! 2. [`intercept_response`] unwraps the `{ code, data, message }` envelope
//!    of a completed response, or passes binary streams through.
//! 3. [`intercept_error`] turns transport failures into an [`ApiError`].
//!
//! Failures in stages 2 and 3 are shown to the user through the context's
//! [`Notifier`] and, for 401/403, invoke the context's session reset hook.
//! The error is always returned to the caller as well.

use std::sync::Arc;

use reqwest::header::{HeaderValue, AUTHORIZATION};
use serde_json::Value;
use tracing::{debug, error, warn};

use super::envelope::{
    Body, Envelope, Method, MultipartField, RequestEnvelope, ResponseType, CONTENT_TYPE_FORM,
    CONTENT_TYPE_MULTIPART,
};
use super::error::is_auth_code;
use super::query::{self, ArrayFormat};
use super::transport::{RawResponse, TransportError};
use super::ApiError;

/// Envelope code the backend uses for success.
pub const SUCCESS_CODE: i64 = 0;

/// Shown when the request went out but nothing came back.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error, please check your network connection";

/// Fallback when an error carries no message at all.
pub const GENERIC_FAILURE_MESSAGE: &str = "request failed";

/// Surface for user-facing error notifications.
pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

/// Notifier that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn error(&self, message: &str) {
        error!(notification = message, "Request failed");
    }
}

/// Callback that resets the application session after an auth failure.
pub type ResetHook = Arc<dyn Fn() + Send + Sync>;

/// Per-request context: the token to send and where failures are reported.
#[derive(Clone)]
pub struct RequestContext {
    pub token: Option<String>,
    pub notifier: Arc<dyn Notifier>,
    pub reset_hook: Option<ResetHook>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            token: None,
            notifier: Arc::new(LogNotifier),
            reset_hook: None,
        }
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("reset_hook", &self.reset_hook.is_some())
            .finish()
    }
}

impl RequestContext {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            token: None,
            notifier,
            reset_hook: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = if token.is_empty() { None } else { Some(token) };
        self
    }

    pub fn with_reset_hook(mut self, hook: ResetHook) -> Self {
        self.reset_hook = Some(hook);
        self
    }

    fn notify(&self, message: &str) {
        error!(notification = message, "Showing error notification");
        self.notifier.error(message);
    }

    fn reset_session(&self) {
        match self.reset_hook {
            Some(ref hook) => {
                warn!("Authentication failed, resetting session");
                hook();
            }
            None => debug!("Authentication failed but no reset hook is installed"),
        }
    }
}

/// Knobs that come from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub success_code: i64,
    /// Convert plain bodies to multipart fields when the content type asks for it.
    pub transform_request_data: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            success_code: SUCCESS_CODE,
            transform_request_data: true,
        }
    }
}

/// What a successful call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePayload {
    /// The unwrapped `data` field of a success envelope.
    Data(Value),
    /// Raw bytes of a binary stream response.
    Blob(Vec<u8>),
}

// ============================================================================
// Request
// ============================================================================

/// Rewrite an outgoing request in place. Never fails.
pub fn intercept_request(request: &mut RequestEnvelope, ctx: &RequestContext, options: &PipelineOptions) {
    if request.method.is_write() {
        let content_type = request.content_type_str().map(str::to_string);
        match content_type.as_deref() {
            Some(CONTENT_TYPE_FORM) => encode_form_body(&mut request.body),
            Some(CONTENT_TYPE_MULTIPART) if options.transform_request_data => {
                encode_multipart_body(&mut request.body)
            }
            _ => {}
        }
    }

    if let Some(ref token) = ctx.token {
        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(value) => {
                request.headers.insert(AUTHORIZATION, value);
            }
            Err(_) => warn!("Session token contains invalid header characters, not sending it"),
        }
    }

    if request.method == Method::Get && !request.params.is_empty() {
        let query = query::build_read_query(&request.params);
        request.url = query::append_query(&request.url, &query);
        request.params.clear();
    }

    debug!(method = %request.method, url = %request.url, "Prepared request");
}

fn encode_form_body(body: &mut Body) {
    match body {
        Body::Json(Value::Object(map)) => {
            let encoded = query::stringify(map, ArrayFormat::Indices);
            *body = Body::UrlEncoded(encoded);
        }
        Body::Json(Value::Null) | Body::Empty => {
            *body = Body::UrlEncoded(String::new());
        }
        _ => {}
    }
}

fn encode_multipart_body(body: &mut Body) {
    if let Body::Json(Value::Object(map)) = body {
        let mut fields = Vec::with_capacity(map.len());
        for (name, value) in map.iter() {
            match value {
                Value::Null => {}
                Value::Array(items) => {
                    for item in items.iter().filter(|v| !v.is_null()) {
                        fields.push(MultipartField::new(name.clone(), query::scalar_text(item)));
                    }
                }
                other => fields.push(MultipartField::new(name.clone(), query::scalar_text(other))),
            }
        }
        *body = Body::Multipart(fields);
    }
}

// ============================================================================
// Response
// ============================================================================

/// Classify a completed response.
///
/// Non-2xx statuses are handed to [`intercept_error`] the same way a
/// transport that rejects error statuses would.
pub fn intercept_response(
    response: RawResponse,
    response_type: ResponseType,
    ctx: &RequestContext,
    options: &PipelineOptions,
) -> Result<ResponsePayload, ApiError> {
    if !(200..300).contains(&response.status) {
        return Err(intercept_error(
            TransportError::Status {
                status: response.status,
                body: response.body,
            },
            ctx,
        ));
    }

    if response_type == ResponseType::Blob {
        debug!(bytes = response.body.len(), "Passing binary response through");
        return Ok(ResponsePayload::Blob(response.body));
    }

    let envelope: Envelope = match serde_json::from_slice(&response.body) {
        Ok(envelope) => envelope,
        Err(e) => {
            let body = String::from_utf8_lossy(&response.body);
            let err = ApiError::InvalidResponse(format!(
                "{}: {}",
                e,
                ApiError::truncate_body(&body)
            ));
            ctx.notify(&err.to_string());
            return Err(err);
        }
    };

    if envelope.code == options.success_code {
        return Ok(ResponsePayload::Data(envelope.data));
    }

    let message = if envelope.message.is_empty() {
        format!("{} (code {})", GENERIC_FAILURE_MESSAGE, envelope.code)
    } else {
        envelope.message
    };
    ctx.notify(&message);
    if is_auth_code(envelope.code) {
        ctx.reset_session();
    }
    Err(ApiError::Business {
        code: envelope.code,
        message,
    })
}

// ============================================================================
// Errors
// ============================================================================

/// Turn a transport failure into an error, notifying the user on the way.
pub fn intercept_error(error: TransportError, ctx: &RequestContext) -> ApiError {
    debug!(error = %error, "Intercepting transport error");
    match error {
        TransportError::Status { status, body } => {
            let message = extract_error_message(status, &body);
            ctx.notify(&message);
            if is_auth_code(i64::from(status)) {
                ctx.reset_session();
            }
            ApiError::from_status(status, &message)
        }
        TransportError::NoResponse(detail) => {
            warn!(detail = %detail, "No response received");
            ctx.notify(NETWORK_ERROR_MESSAGE);
            ApiError::Network(detail)
        }
        TransportError::Local(detail) => {
            let message = if detail.is_empty() {
                GENERIC_FAILURE_MESSAGE.to_string()
            } else {
                detail
            };
            ctx.notify(&message);
            ApiError::Request(message)
        }
    }
}

/// Best-effort message from an error body: `message`, then `error`, then a status string.
pub fn extract_error_message(status: u16, body: &[u8]) -> String {
    let payload: Option<Value> = serde_json::from_slice(body).ok();
    let field = |name: &str| {
        payload
            .as_ref()
            .and_then(|p| p.get(name))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    field("message")
        .or_else(|| field("error"))
        .unwrap_or_else(|| format!("{} ({})", GENERIC_FAILURE_MESSAGE, status))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use reqwest::header::CONTENT_TYPE;
    use serde_json::json;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        messages: Mutex<Vec<String>>,
    }

    impl Notifier for Recorder {
        fn error(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    fn context() -> (RequestContext, Arc<Recorder>, Arc<AtomicUsize>) {
        let recorder = Arc::new(Recorder::default());
        let resets = Arc::new(AtomicUsize::new(0));
        let counter = resets.clone();
        let ctx = RequestContext::new(recorder.clone()).with_reset_hook(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        (ctx, recorder, resets)
    }

    fn ok(body: Value) -> RawResponse {
        RawResponse {
            status: 200,
            body: body.to_string().into_bytes(),
        }
    }

    fn params(value: Value) -> serde_json::Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_get_params_are_moved_into_url() {
        let (ctx, _, _) = context();
        let mut req = RequestEnvelope::get("/apis/v1/certs")
            .params(params(json!({"tags": ["a", "b"], "status": null, "page": 1})));
        intercept_request(&mut req, &ctx, &PipelineOptions::default());
        assert_eq!(req.url, "/apis/v1/certs?tags=a&tags=b&page=1");
        assert!(req.params.is_empty());
    }

    #[test]
    fn test_get_with_only_null_params_leaves_url() {
        let (ctx, _, _) = context();
        let mut req = RequestEnvelope::get("/api/v1/iam/users")
            .params(params(json!({"keyword": null})));
        intercept_request(&mut req, &ctx, &PipelineOptions::default());
        assert_eq!(req.url, "/api/v1/iam/users");
    }

    #[test]
    fn test_bearer_token_attached() {
        let (ctx, _, _) = context();
        let ctx = ctx.with_token("abc");
        let mut req = RequestEnvelope::get("/x");
        intercept_request(&mut req, &ctx, &PipelineOptions::default());
        assert_eq!(req.headers.get(AUTHORIZATION).unwrap(), "Bearer abc");

        let (anon, _, _) = context();
        let mut req = RequestEnvelope::get("/x");
        intercept_request(&mut req, &anon, &PipelineOptions::default());
        assert!(req.headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_form_body_is_url_encoded() {
        let (ctx, _, _) = context();
        let mut req = RequestEnvelope::post("/login")
            .content_type(CONTENT_TYPE_FORM)
            .json(json!({"username": "a b", "scopes": ["r", "w"]}));
        intercept_request(&mut req, &ctx, &PipelineOptions::default());
        assert_eq!(
            req.body,
            Body::UrlEncoded("username=a%20b&scopes%5B0%5D=r&scopes%5B1%5D=w".to_string())
        );
        assert_eq!(req.headers.get(CONTENT_TYPE).unwrap(), CONTENT_TYPE_FORM);
    }

    #[test]
    fn test_multipart_body_converted_field_by_field() {
        let (ctx, _, _) = context();
        let mut req = RequestEnvelope::post("/upload")
            .content_type(CONTENT_TYPE_MULTIPART)
            .json(json!({"name": "n", "tags": ["a", "b"], "skip": null, "dup": false}));
        intercept_request(&mut req, &ctx, &PipelineOptions::default());
        assert_eq!(
            req.body,
            Body::Multipart(vec![
                MultipartField::new("name", "n"),
                MultipartField::new("tags", "a"),
                MultipartField::new("tags", "b"),
                MultipartField::new("dup", "false"),
            ])
        );
    }

    #[test]
    fn test_multipart_untouched_when_transform_disabled() {
        let (ctx, _, _) = context();
        let options = PipelineOptions {
            transform_request_data: false,
            ..PipelineOptions::default()
        };
        let mut req = RequestEnvelope::post("/upload")
            .content_type(CONTENT_TYPE_MULTIPART)
            .json(json!({"name": "n"}));
        intercept_request(&mut req, &ctx, &options);
        assert_eq!(req.body, Body::Json(json!({"name": "n"})));
    }

    #[test]
    fn test_success_envelope_returns_data_unmodified() {
        let (ctx, recorder, resets) = context();
        let data = json!({"list": [{"id": 1}], "total": 1});
        let result = intercept_response(
            ok(json!({"code": 0, "data": data.clone(), "message": "ok"})),
            ResponseType::Json,
            &ctx,
            &PipelineOptions::default(),
        );
        assert_eq!(result, Ok(ResponsePayload::Data(data)));
        assert!(recorder.messages.lock().unwrap().is_empty());
        assert_eq!(resets.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_blob_passes_through() {
        let (ctx, _, _) = context();
        let raw = RawResponse {
            status: 200,
            body: vec![0x30, 0x82, 0x01],
        };
        let result = intercept_response(raw, ResponseType::Blob, &ctx, &PipelineOptions::default());
        assert_eq!(result, Ok(ResponsePayload::Blob(vec![0x30, 0x82, 0x01])));
    }

    #[test]
    fn test_business_auth_failure_resets_once() {
        let (ctx, recorder, resets) = context();
        let result = intercept_response(
            ok(json!({"code": 401, "data": null, "message": "token expired"})),
            ResponseType::Json,
            &ctx,
            &PipelineOptions::default(),
        );
        assert_eq!(
            result,
            Err(ApiError::Business {
                code: 401,
                message: "token expired".to_string()
            })
        );
        assert_eq!(resets.load(Ordering::SeqCst), 1);
        assert_eq!(*recorder.messages.lock().unwrap(), vec!["token expired"]);
    }

    #[test]
    fn test_business_failure_without_auth_code_does_not_reset() {
        let (ctx, recorder, resets) = context();
        let result = intercept_response(
            ok(json!({"code": 10001, "message": "duplicate certificate"})),
            ResponseType::Json,
            &ctx,
            &PipelineOptions::default(),
        );
        assert!(result.is_err());
        assert_eq!(resets.load(Ordering::SeqCst), 0);
        assert_eq!(*recorder.messages.lock().unwrap(), vec!["duplicate certificate"]);
    }

    #[test]
    fn test_custom_success_code() {
        let (ctx, _, _) = context();
        let options = PipelineOptions {
            success_code: 200,
            ..PipelineOptions::default()
        };
        let result = intercept_response(
            ok(json!({"code": 200, "data": [1, 2]})),
            ResponseType::Json,
            &ctx,
            &options,
        );
        assert_eq!(result, Ok(ResponsePayload::Data(json!([1, 2]))));
    }

    #[test]
    fn test_status_error_prefers_payload_message() {
        let (ctx, recorder, resets) = context();
        let err = intercept_error(
            TransportError::Status {
                status: 500,
                body: br#"{"message": "boom", "error": "ignored"}"#.to_vec(),
            },
            &ctx,
        );
        assert_eq!(
            err,
            ApiError::Http {
                status: 500,
                message: "boom".to_string()
            }
        );
        assert_eq!(*recorder.messages.lock().unwrap(), vec!["boom"]);
        assert_eq!(resets.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_status_error_message_fallbacks() {
        assert_eq!(extract_error_message(400, br#"{"error": "bad input"}"#), "bad input");
        assert_eq!(
            extract_error_message(404, br#"{"message": "", "error": ""}"#),
            "request failed (404)"
        );
        assert_eq!(extract_error_message(502, b"<html>bad gateway</html>"), "request failed (502)");
    }

    #[test]
    fn test_status_403_resets_session() {
        let (ctx, _, resets) = context();
        let err = intercept_error(
            TransportError::Status {
                status: 403,
                body: b"{}".to_vec(),
            },
            &ctx,
        );
        assert!(err.is_auth_failure());
        assert_eq!(resets.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_non_2xx_response_goes_through_error_path() {
        let (ctx, recorder, _) = context();
        let raw = RawResponse {
            status: 500,
            body: br#"{"message": "boom"}"#.to_vec(),
        };
        let result = intercept_response(raw, ResponseType::Json, &ctx, &PipelineOptions::default());
        assert!(matches!(result, Err(ApiError::Http { status: 500, .. })));
        assert_eq!(*recorder.messages.lock().unwrap(), vec!["boom"]);
    }

    #[test]
    fn test_network_and_local_errors() {
        let (ctx, recorder, _) = context();
        let err = intercept_error(TransportError::NoResponse("connection refused".into()), &ctx);
        assert_eq!(err, ApiError::Network("connection refused".to_string()));

        let err = intercept_error(TransportError::Local(String::new()), &ctx);
        assert_eq!(err, ApiError::Request(GENERIC_FAILURE_MESSAGE.to_string()));

        let err = intercept_error(TransportError::Local("invalid url".into()), &ctx);
        assert_eq!(err, ApiError::Request("invalid url".to_string()));

        assert_eq!(
            *recorder.messages.lock().unwrap(),
            vec![NETWORK_ERROR_MESSAGE, GENERIC_FAILURE_MESSAGE, "invalid url"]
        );
    }

    #[test]
    fn test_non_envelope_body_is_invalid_response() {
        let (ctx, recorder, _) = context();
        let raw = RawResponse {
            status: 200,
            body: b"not json".to_vec(),
        };
        let result = intercept_response(raw, ResponseType::Json, &ctx, &PipelineOptions::default());
        assert!(matches!(result, Err(ApiError::InvalidResponse(_))));
        assert_eq!(recorder.messages.lock().unwrap().len(), 1);
    }
}
