/// Classification of a [`MarketDataError`](super::MarketDataError).
///
/// Used by connectors to pick diagnostic states and by the server to pick
/// an HTTP status.
///
/// | Kind | Whose fault | HTTP status |
/// |------|-------------|-------------|
/// | `Validation` | caller | 400 |
/// | `NotFound` | caller | 404 |
/// | `NotConfigured` | operator | 503 |
/// | `UpstreamAuth` | operator | 502 |
/// | `UpstreamRateLimited` | upstream | 503 |
/// | `Upstream` | upstream | 502 |
/// | `Timeout` | upstream | 504 |
/// | `NotSupported` | nobody | 501 |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Bad or oversized input, rejected before any upstream call.
    Validation,

    /// The requested provider or resource does not exist.
    NotFound,

    /// A credential is missing.
    NotConfigured,

    /// The credential was rejected upstream.
    UpstreamAuth,

    /// The upstream is throttling us.
    UpstreamRateLimited,

    /// Non-2xx, transport or decode failure.
    Upstream,

    /// The call was aborted after the configured timeout.
    Timeout,

    /// The provider offers no integration path.
    NotSupported,
}

impl ErrorKind {
    /// HTTP status a server should answer with for this kind.
    pub fn status_code(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::NotFound => 404,
            Self::NotConfigured | Self::UpstreamRateLimited => 503,
            Self::UpstreamAuth | Self::Upstream => 502,
            Self::Timeout => 504,
            Self::NotSupported => 501,
        }
    }
}
