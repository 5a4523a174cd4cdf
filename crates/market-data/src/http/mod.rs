//! HTTP utility layer shared by every connector and pricing source.
//!
//! This module contains:
//! - The [`HttpTransport`] seam and its `reqwest` implementation
//! - [`HttpClient`], which applies the configured timeout to every call
//! - Body decoding ([`read_response_body`])
//! - Secret redaction and error-message extraction (see [`sanitize`])
//!
//! Connectors never touch `reqwest` directly; they build an [`HttpRequest`]
//! and hand it to an [`HttpClient`]. Tests swap the transport for a scripted
//! fake and count calls.

mod sanitize;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use sanitize::{extract_error_message, safe_error_message, sanitize_message, REDACTED};
pub use transport::{HttpTransport, ReqwestTransport};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use crate::errors::MarketDataError;

/// Default upstream timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Lower bound for a configured timeout override.
pub const MIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Upper bound for a configured timeout override.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(60);

/// An outbound GET request, independent of the transport that executes it.
///
/// Every upstream used here is read-only, so there is no method or body.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// Create a GET request for `url`.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    /// Add a header. Later values for the same name are sent as well.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up the first header with the given name (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// A fully buffered response.
#[derive(Clone, Debug, Default)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are stored lowercased.
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The `content-type` header, if present.
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }
}

/// Decode a response body.
///
/// JSON content types are parsed into a [`Value`]; anything else is returned
/// as a [`Value::String`]. Returns `None` when the body cannot be decoded.
/// Never fails.
pub fn read_response_body(response: &HttpResponse) -> Option<Value> {
    let is_json = response
        .content_type()
        .map(|ct| ct.to_ascii_lowercase().contains("json"))
        .unwrap_or(false);

    if is_json {
        return serde_json::from_slice(&response.body).ok();
    }

    std::str::from_utf8(&response.body)
        .ok()
        .map(|text| Value::String(text.to_string()))
}

/// Resolve the effective timeout from an optional millisecond override.
///
/// Missing or unparseable values fall back to [`DEFAULT_TIMEOUT`]; parsed
/// values are clamped to [`MIN_TIMEOUT`, `MAX_TIMEOUT`].
pub fn resolve_timeout(override_ms: Option<&str>) -> Duration {
    override_ms
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
        .map(|timeout| timeout.clamp(MIN_TIMEOUT, MAX_TIMEOUT))
        .unwrap_or(DEFAULT_TIMEOUT)
}

/// Timeout-bounded request executor.
///
/// Cheap to clone; all clones share the same transport.
#[derive(Clone)]
pub struct HttpClient {
    transport: Arc<dyn HttpTransport>,
    timeout: Duration,
}

impl HttpClient {
    /// Create a client over `transport` with a default timeout.
    pub fn new(transport: Arc<dyn HttpTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// The default timeout applied by [`HttpClient::fetch`].
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute `request` with the client's default timeout.
    pub async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, MarketDataError> {
        self.fetch_with_timeout(request, self.timeout).await
    }

    /// Execute `request`, aborting it once `timeout` elapses.
    ///
    /// Any response caching is disabled. A timeout always surfaces as
    /// [`MarketDataError::Timeout`], distinguishable from other transport failures.
    pub async fn fetch_with_timeout(
        &self,
        request: HttpRequest,
        timeout: Duration,
    ) -> Result<HttpResponse, MarketDataError> {
        let request = if request.header_value("cache-control").is_none() {
            request.header("Cache-Control", "no-store")
        } else {
            request
        };

        match tokio::time::timeout(timeout, self.transport.execute(request, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(MarketDataError::Timeout),
        }
    }
}
