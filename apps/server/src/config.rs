use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use folio_market_data::AggregatorConfig;

pub const DEFAULT_PRICES_PER_MINUTE: u32 = 60;
pub const DEFAULT_PLAYGROUND_PER_MINUTE: u32 = 10;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub log_format: String,
    /// Per-client budget for each price route.
    pub prices_per_minute: u32,
    /// Per-client budget for connector tests.
    pub playground_per_minute: u32,
    pub aggregator: AggregatorConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let per_minute = |key: &str, default: u32| {
            get(key)
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(default)
        };

        let listen_addr: SocketAddr = get("FOLIO_LISTEN_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse()
            .context("Invalid FOLIO_LISTEN_ADDR")?;
        let cors_allow = get("FOLIO_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 = get("FOLIO_REQUEST_TIMEOUT_MS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(90_000);

        Ok(Self {
            listen_addr,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            log_format: get("FOLIO_LOG_FORMAT").unwrap_or_else(|| "text".to_string()),
            prices_per_minute: per_minute("RATE_LIMIT_PRICES_PER_MINUTE", DEFAULT_PRICES_PER_MINUTE),
            playground_per_minute: per_minute(
                "RATE_LIMIT_PLAYGROUND_PER_MINUTE",
                DEFAULT_PLAYGROUND_PER_MINUTE,
            ),
            aggregator: AggregatorConfig::from_lookup(lookup),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(move |key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.listen_addr.port(), 8080);
        assert_eq!(config.cors_allow, vec!["*".to_string()]);
        assert_eq!(config.prices_per_minute, DEFAULT_PRICES_PER_MINUTE);
        assert_eq!(config.playground_per_minute, DEFAULT_PLAYGROUND_PER_MINUTE);
        assert!(config.aggregator.trading212.api_key.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("FOLIO_LISTEN_ADDR", "127.0.0.1:9000"),
            ("FOLIO_CORS_ALLOW_ORIGINS", "https://a.test, https://b.test"),
            ("RATE_LIMIT_PRICES_PER_MINUTE", "5"),
            ("RATE_LIMIT_PLAYGROUND_PER_MINUTE", "0"),
            ("TRADING212_API_KEY", "abc"),
        ])
        .unwrap();
        assert_eq!(config.listen_addr.port(), 9000);
        assert_eq!(config.cors_allow.len(), 2);
        assert_eq!(config.prices_per_minute, 5);
        assert_eq!(config.playground_per_minute, DEFAULT_PLAYGROUND_PER_MINUTE);
        assert_eq!(config.aggregator.trading212.api_key.as_deref(), Some("abc"));
    }

    #[test]
    fn test_invalid_listen_addr() {
        assert!(config(&[("FOLIO_LISTEN_ADDR", "nope")]).is_err());
    }
}
