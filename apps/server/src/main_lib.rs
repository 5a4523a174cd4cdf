use std::sync::Arc;

use folio_market_data::{
    default_http_client, ConnectorRegistry, HttpClient, PriceResolver, RateLimitOptions,
    RateLimiter,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

pub struct AppState {
    pub registry: ConnectorRegistry,
    pub prices: PriceResolver,
    pub limiter: Arc<RateLimiter>,
    pub prices_limit: RateLimitOptions,
    pub playground_limit: RateLimitOptions,
}

pub fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    build_state_with_http(config, default_http_client(&config.aggregator))
}

/// Build the state over an explicit HTTP client.
pub fn build_state_with_http(config: &Config, http: HttpClient) -> anyhow::Result<Arc<AppState>> {
    tracing::info!(
        "Upstream timeout {:?}, Trading 212 key {}",
        config.aggregator.http_timeout,
        if config.aggregator.trading212.api_key.is_some() {
            "configured"
        } else {
            "missing"
        }
    );

    let registry = ConnectorRegistry::new(&config.aggregator, http.clone());
    let prices = PriceResolver::new(&config.aggregator, http);

    Ok(Arc::new(AppState {
        registry,
        prices,
        limiter: Arc::new(RateLimiter::new()),
        prices_limit: RateLimitOptions::per_minute(config.prices_per_minute),
        playground_limit: RateLimitOptions::per_minute(config.playground_per_minute),
    }))
}
