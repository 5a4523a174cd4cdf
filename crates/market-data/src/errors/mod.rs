//! Error types and classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all aggregation operations
//! - [`ErrorKind`]: Coarse classification used to pick diagnostic states and HTTP statuses

mod kind;

pub use kind::ErrorKind;

use thiserror::Error;

/// Fixed message surfaced for every upstream timeout, regardless of the
/// transport's own error text.
pub const TIMEOUT_MESSAGE: &str = "The upstream provider did not respond in time. Please try again.";

/// Fallback message when an error carries no usable text.
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred while contacting the provider.";

/// Errors that can occur while talking to upstream providers.
///
/// All string payloads are expected to be sanitized before construction;
/// use [`crate::http::sanitize_message`] on anything derived from upstream text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MarketDataError {
    /// Bad or oversized caller input. No upstream call was made.
    #[error("{0}")]
    Validation(String),

    /// The provider has no credential configured.
    #[error("{provider} is not configured: {message}")]
    NotConfigured {
        /// The provider missing a credential
        provider: String,
        /// Remediation hint for the operator
        message: String,
    },

    /// The provider was reachable but rejected the credential (HTTP 401/403).
    #[error("{provider} rejected the credential (HTTP {status})")]
    UpstreamAuth {
        /// The provider that rejected the request
        provider: String,
        /// The HTTP status returned
        status: u16,
    },

    /// The provider is rate limiting us (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// Any other non-2xx response.
    #[error("{provider} returned HTTP {status}: {message}")]
    Upstream {
        /// The provider that returned the error
        provider: String,
        /// The HTTP status returned
        status: u16,
        /// Extracted, sanitized upstream message
        message: String,
    },

    /// The request exceeded the configured timeout and was aborted.
    #[error("{}", TIMEOUT_MESSAGE)]
    Timeout,

    /// The provider has no official integration path.
    #[error("{provider} is not supported: {message}")]
    NotSupported {
        /// The unsupported provider
        provider: String,
        /// Suggested alternative
        message: String,
    },

    /// Connection-level failure (DNS, TLS, reset...). Message is sanitized.
    #[error("Network error: {0}")]
    Transport(String),

    /// The upstream payload could not be decoded into the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// The provider identifier is not part of the registry.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
}

impl MarketDataError {
    /// Returns the classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use folio_market_data::errors::{ErrorKind, MarketDataError};
    ///
    /// let error = MarketDataError::RateLimited { provider: "COINGECKO".to_string() };
    /// assert_eq!(error.kind(), ErrorKind::UpstreamRateLimited);
    ///
    /// let error = MarketDataError::Validation("too many symbols".to_string());
    /// assert_eq!(error.kind(), ErrorKind::Validation);
    /// ```
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::UnknownProvider(_) => ErrorKind::NotFound,
            Self::NotConfigured { .. } => ErrorKind::NotConfigured,
            Self::UpstreamAuth { .. } => ErrorKind::UpstreamAuth,
            Self::RateLimited { .. } => ErrorKind::UpstreamRateLimited,
            Self::Upstream { .. } | Self::Transport(_) | Self::Decode(_) => ErrorKind::Upstream,
            Self::Timeout => ErrorKind::Timeout,
            Self::NotSupported { .. } => ErrorKind::NotSupported,
        }
    }

    /// Builds the error matching an HTTP status returned by `provider`.
    ///
    /// 401/403 become [`MarketDataError::UpstreamAuth`], 429 becomes
    /// [`MarketDataError::RateLimited`], everything else is [`MarketDataError::Upstream`].
    pub fn from_status(provider: &str, status: u16, message: Option<String>) -> Self {
        match status {
            401 | 403 => Self::UpstreamAuth {
                provider: provider.to_string(),
                status,
            },
            429 => Self::RateLimited {
                provider: provider.to_string(),
            },
            _ => Self::Upstream {
                provider: provider.to_string(),
                status,
                message: message.unwrap_or_else(|| format!("HTTP {}", status)),
            },
        }
    }
}
