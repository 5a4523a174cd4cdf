use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{ErrorKind, MarketDataError};
use crate::http::safe_error_message;

/// Closed set of brokerage providers known to the registry.
///
/// Adding a variant is backward compatible; removing one is breaking.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    Trading212,
    InteractiveBrokers,
    Revolut,
    TradeRepublic,
}

impl ProviderId {
    /// Every provider, in registry order.
    pub const ALL: [ProviderId; 4] = [
        ProviderId::Trading212,
        ProviderId::InteractiveBrokers,
        ProviderId::Revolut,
        ProviderId::TradeRepublic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trading212 => "trading212",
            Self::InteractiveBrokers => "interactive_brokers",
            Self::Revolut => "revolut",
            Self::TradeRepublic => "trade_republic",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = MarketDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| MarketDataError::UnknownProvider(s.chars().take(64).collect()))
    }
}

/// How much of a provider's data we can reach.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupportLevel {
    Supported,
    Partial,
    Unsupported,
}

/// Diagnostic state for connectivity and authentication.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Ok,
    Error,
    NotConfigured,
    Limited,
    NotSupported,
}

/// Static metadata describing a provider, independent of any live call.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDescriptor {
    pub id: ProviderId,
    pub display_name: &'static str,
    pub support: SupportLevel,
    pub capabilities: &'static [&'static str],
    pub requirements: &'static [&'static str],
    pub docs_url: &'static str,
}

/// Provider-agnostic representation of one portfolio position.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedHolding {
    pub external_id: String,
    pub symbol: String,
    pub name: String,
    /// Always strictly positive.
    pub quantity: f64,
    pub unit_price: Option<f64>,
    pub market_value: Option<f64>,
    pub currency: String,
    pub asset_class: String,
    pub source_type: String,
    /// Untransformed upstream record. Stripped before results leave the core.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
}

/// Result of one diagnostic connector run.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaygroundTestResult {
    pub provider_id: ProviderId,
    pub support: SupportLevel,
    pub connection_status: ConnectionStatus,
    pub auth_status: ConnectionStatus,
    pub holdings: Vec<NormalizedHolding>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub fetched_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_summary: Option<Value>,
}

impl PlaygroundTestResult {
    /// Start a result for `descriptor` with both statuses set to `status`.
    pub fn new(descriptor: &ProviderDescriptor, status: ConnectionStatus) -> Self {
        Self {
            provider_id: descriptor.id,
            support: descriptor.support,
            connection_status: status,
            auth_status: status,
            holdings: Vec::new(),
            warnings: Vec::new(),
            errors: Vec::new(),
            fetched_at: Utc::now(),
            raw_summary: None,
        }
    }

    pub fn with_statuses(mut self, connection: ConnectionStatus, auth: ConnectionStatus) -> Self {
        self.connection_status = connection;
        self.auth_status = auth;
        self
    }

    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warnings.push(warning.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.errors.push(error.into());
        self
    }

    /// Fold `error` into the result: statuses follow its kind and its safe
    /// message is appended to `errors`.
    ///
    /// | Kind | connection | auth |
    /// |------|------------|------|
    /// | `NotConfigured` | `not_configured` | `not_configured` |
    /// | `NotSupported` | `not_supported` | `not_supported` |
    /// | `UpstreamAuth` | `ok` | `error` |
    /// | `UpstreamRateLimited` | `ok` | `ok` |
    /// | anything else | `error` | `error` |
    pub fn with_failure(self, error: &MarketDataError) -> Self {
        let (connection, auth) = match error.kind() {
            ErrorKind::NotConfigured => (
                ConnectionStatus::NotConfigured,
                ConnectionStatus::NotConfigured,
            ),
            ErrorKind::NotSupported => (
                ConnectionStatus::NotSupported,
                ConnectionStatus::NotSupported,
            ),
            ErrorKind::UpstreamAuth => (ConnectionStatus::Ok, ConnectionStatus::Error),
            ErrorKind::UpstreamRateLimited => (ConnectionStatus::Ok, ConnectionStatus::Ok),
            ErrorKind::Validation
            | ErrorKind::NotFound
            | ErrorKind::Upstream
            | ErrorKind::Timeout => (ConnectionStatus::Error, ConnectionStatus::Error),
        };
        self.with_statuses(connection, auth)
            .with_error(safe_error_message(error))
    }

    /// Enforce result invariants: no holdings unless authentication succeeded.
    pub fn finish(mut self) -> Self {
        if self.auth_status != ConnectionStatus::Ok {
            self.holdings.clear();
        }
        self
    }

    /// Client-facing form: every holding's `raw` record is removed.
    pub fn sanitized(mut self) -> Self {
        for holding in &mut self.holdings {
            holding.raw = None;
        }
        self
    }
}

/// Per-run overrides supplied by the caller of a diagnostic test.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunOptions {
    /// Credential to use instead of the configured one. Never echoed back.
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub default_currency: Option<String>,
}

impl fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunOptions")
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .field("base_url", &self.base_url)
            .field("default_currency", &self.default_currency)
            .finish()
    }
}
