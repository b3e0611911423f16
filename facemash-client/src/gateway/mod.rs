//! Request gateway
//!
//! Single entry point for backend calls. Normalizes the path under the fixed
//! `/api` root, attaches the host-supplied credential, bounds every call with
//! a timeout and folds every failure into a [`GatewayError`]. Nothing below
//! this module ever sees a raw transport error.

pub mod transport;

use std::sync::Arc;
use std::time::{Duration, Instant};

use facemash_common::api::{authorization_header, ApiEnvelope};
use facemash_common::config::ClientConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{ErrorKind, GatewayError};
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport, TransportError};

/// Fixed API root every path is normalized under
pub const API_ROOT: &str = "/api";

/// Longest body excerpt carried in an error message
const ERROR_BODY_EXCERPT: usize = 200;

/// Per-call options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOptions {
    pub query: Vec<(String, String)>,
    /// Overrides the gateway default when set
    pub timeout: Option<Duration>,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Make `path` absolute under [`API_ROOT`]
///
/// # Examples
///
/// ```
/// use facemash_client::gateway::normalize_path;
///
/// assert_eq!(normalize_path("persons"), "/api/persons");
/// assert_eq!(normalize_path("/persons"), "/api/persons");
/// assert_eq!(normalize_path("/api/persons"), "/api/persons");
/// ```
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim();
    let absolute = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    };

    if absolute == API_ROOT || absolute.starts_with(&format!("{}/", API_ROOT)) {
        absolute
    } else {
        format!("{}{}", API_ROOT, absolute)
    }
}

pub struct RequestGateway {
    transport: Arc<dyn Transport>,
    base_url: String,
    credential: Option<String>,
    default_timeout: Duration,
}

impl RequestGateway {
    pub fn new(
        transport: Arc<dyn Transport>,
        base_url: impl Into<String>,
        credential: Option<String>,
        default_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential,
            default_timeout,
        }
    }

    /// Gateway over a real HTTP transport, configured from `config`
    pub fn from_config(config: &ClientConfig) -> Result<Self, GatewayError> {
        let transport =
            ReqwestTransport::new().map_err(|e| GatewayError::network(e.to_string()))?;
        Ok(Self::new(
            Arc::new(transport),
            config.api_base_url.clone(),
            config.init_data.clone(),
            config.request_timeout,
        ))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform a call and decode its payload
    ///
    /// Empty bodies decode as JSON `null`. A body that is itself an envelope
    /// (`{"success": bool, ...}`) is unwrapped, and `success: false` becomes
    /// an `UnknownError` carrying the backend's message.
    pub async fn call<D: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        payload: Option<Value>,
        options: CallOptions,
    ) -> Result<D, GatewayError> {
        let path = normalize_path(path);
        let started = Instant::now();

        let result = self.dispatch(method, &path, payload, options).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => info!(method = %method, path = %path, elapsed_ms, "Request succeeded"),
            Err(e) => warn!(
                method = %method,
                path = %path,
                kind = ?e.kind,
                elapsed_ms,
                error = %e.message,
                "Request failed"
            ),
        }
        result
    }

    /// Like [`call`](Self::call), reported as a `{success, data?, message?}` envelope
    pub async fn call_envelope<D: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        payload: Option<Value>,
        options: CallOptions,
    ) -> ApiEnvelope<D> {
        self.call(method, path, payload, options).await.into()
    }

    pub async fn get<D: DeserializeOwned>(
        &self,
        path: &str,
        options: CallOptions,
    ) -> Result<D, GatewayError> {
        self.call(Method::Get, path, None, options).await
    }

    pub async fn post<D: DeserializeOwned, P: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &P,
        options: CallOptions,
    ) -> Result<D, GatewayError> {
        let body = serde_json::to_value(payload)
            .map_err(|e| GatewayError::validation(format!("Unserializable payload: {}", e)))?;
        self.call(Method::Post, path, Some(body), options).await
    }

    async fn dispatch<D: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        payload: Option<Value>,
        options: CallOptions,
    ) -> Result<D, GatewayError> {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if let Some(credential) = &self.credential {
            let value = authorization_header(credential)
                .map_err(|e| GatewayError::auth(e.to_string()))?;
            headers.push(("Authorization".to_string(), value));
        }

        let timeout = options.timeout.unwrap_or(self.default_timeout);
        let request = HttpRequest {
            method,
            url: format!("{}{}", self.base_url, path),
            query: options.query,
            headers,
            body: payload,
            timeout,
        };

        debug!(method = %method, path = %path, timeout_ms = timeout.as_millis() as u64, "Sending request");

        // Outer bound in case a transport ignores the per-request timeout
        let response = match tokio::time::timeout(timeout, self.transport.send(request)).await {
            Err(_) | Ok(Err(TransportError::Timeout)) => {
                return Err(GatewayError::network(format!(
                    "Request timed out after {} ms",
                    timeout.as_millis()
                )));
            }
            Ok(Err(e)) => return Err(GatewayError::network(e.to_string())),
            Ok(Ok(response)) => response,
        };

        classify_status(&response)?;
        decode_body(&response.body)
    }
}

fn classify_status(response: &HttpResponse) -> Result<(), GatewayError> {
    let status = response.status;
    if (200..300).contains(&status) {
        return Ok(());
    }

    let message = format!("HTTP {}: {}", status, excerpt(&response.body));
    Err(match status {
        401 | 403 => GatewayError::auth(message),
        _ => GatewayError::unknown(message),
    })
}

fn decode_body<D: DeserializeOwned>(body: &str) -> Result<D, GatewayError> {
    let value = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str::<Value>(body)
            .map_err(|e| GatewayError::validation(format!("Response is not JSON: {}", e)))?
    };

    let payload = unwrap_envelope(value)?;
    serde_json::from_value(payload)
        .map_err(|e| GatewayError::validation(format!("Unexpected response shape: {}", e)))
}

fn unwrap_envelope(value: Value) -> Result<Value, GatewayError> {
    let is_envelope = value
        .as_object()
        .map(|obj| obj.get("success").map(Value::is_boolean).unwrap_or(false))
        .unwrap_or(false);
    if !is_envelope {
        return Ok(value);
    }

    let envelope: ApiEnvelope<Value> = serde_json::from_value(value)
        .map_err(|e| GatewayError::validation(format!("Malformed envelope: {}", e)))?;
    if envelope.success {
        Ok(envelope.data.unwrap_or(Value::Null))
    } else {
        Err(GatewayError::new(
            ErrorKind::UnknownError,
            envelope
                .message
                .unwrap_or_else(|| "Request failed".to_string()),
        ))
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= ERROR_BODY_EXCERPT {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(ERROR_BODY_EXCERPT).collect();
        format!("{}...", cut)
    }
}
