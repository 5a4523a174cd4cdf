//! Provider credentials and tunables, read from plain key/value settings.

use std::fmt;
use std::time::Duration;

use crate::http::resolve_timeout;

pub const DEFAULT_COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";
pub const DEFAULT_DEXSCREENER_BASE_URL: &str = "https://api.dexscreener.com";
pub const DEFAULT_TRADING212_BASE_URL: &str = "https://live.trading212.com/api/v0";
pub const DEFAULT_HOLDING_CURRENCY: &str = "EUR";

/// Trading 212 connector settings.
#[derive(Clone)]
pub struct Trading212Settings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub default_currency: String,
}

impl fmt::Debug for Trading212Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trading212Settings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<set>"))
            .field("base_url", &self.base_url)
            .field("default_currency", &self.default_currency)
            .finish()
    }
}

/// Everything the aggregation layer needs from its environment.
#[derive(Clone)]
pub struct AggregatorConfig {
    /// Upstream timeout, already clamped.
    pub http_timeout: Duration,
    pub coingecko_base_url: String,
    pub coingecko_api_key: Option<String>,
    pub dexscreener_base_url: String,
    pub trading212: Trading212Settings,
}

impl fmt::Debug for AggregatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AggregatorConfig")
            .field("http_timeout", &self.http_timeout)
            .field("coingecko_base_url", &self.coingecko_base_url)
            .field(
                "coingecko_api_key",
                &self.coingecko_api_key.as_ref().map(|_| "<set>"),
            )
            .field("dexscreener_base_url", &self.dexscreener_base_url)
            .field("trading212", &self.trading212)
            .finish()
    }
}

impl AggregatorConfig {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key/value source.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let url = |key: &str, default: &str| {
            get(key)
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            http_timeout: resolve_timeout(get("PROVIDER_HTTP_TIMEOUT_MS").as_deref()),
            coingecko_base_url: url("COINGECKO_BASE_URL", DEFAULT_COINGECKO_BASE_URL),
            coingecko_api_key: get("COINGECKO_API_KEY"),
            dexscreener_base_url: url("DEXSCREENER_BASE_URL", DEFAULT_DEXSCREENER_BASE_URL),
            trading212: Trading212Settings {
                api_key: get("TRADING212_API_KEY"),
                base_url: url("TRADING212_BASE_URL", DEFAULT_TRADING212_BASE_URL),
                default_currency: get("TRADING212_DEFAULT_CURRENCY")
                    .map(|c| c.to_uppercase())
                    .unwrap_or_else(|| DEFAULT_HOLDING_CURRENCY.to_string()),
            },
        }
    }
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
