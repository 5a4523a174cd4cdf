//! Folio Market Data Crate
//!
//! Aggregates prices and brokerage holdings from third-party providers with
//! inconsistent availability, schemas, authentication and rate limits, and
//! returns one uniform, sanitized result shape regardless of which provider
//! answered.
//!
//! # Overview
//!
//! The crate supports:
//! - Per-scope fixed-window rate limiting with a pluggable counter store
//! - Timeout-bounded HTTP with secret redaction on every error path
//! - Brokerage connectors behind one diagnostic contract
//! - Price resolution by ticker (CoinGecko) or on-chain address (DexScreener)
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |     Caller       | --> |   RateLimiter    |  (per scope + client)
//! +------------------+     +------------------+
//!          |                         |
//!          v                         v
//! +------------------+     +------------------+
//! | ConnectorRegistry|     |  PriceResolver   |
//! +------------------+     +------------------+
//!          |                         |
//!          v                         v
//! +------------------+     +------------------+
//! |    Connector     |     | CoinGecko / Dex  |
//! +------------------+     +------------------+
//!          \                        /
//!           v                      v
//!          +------------------------+
//!          |       HttpClient       |  (timeout, redaction)
//!          +------------------------+
//! ```
//!
//! # Core Types
//!
//! - [`RateLimiter`] - Fixed-window counter keyed by scope and client
//! - [`HttpClient`] - Timeout-bounded executor over an [`HttpTransport`]
//! - [`Connector`] - Provider probe returning a [`PlaygroundTestResult`]
//! - [`ConnectorRegistry`] - Lookup table from provider id to connector
//! - [`PriceResolver`] - Symbol, mint and DEX price lookups
//! - [`AggregatorConfig`] - Credentials and tunables from the environment

pub mod config;
pub mod connectors;
pub mod errors;
pub mod http;
pub mod pricing;
pub mod rate_limit;
pub mod registry;

pub use config::{AggregatorConfig, Trading212Settings};

pub use errors::{ErrorKind, MarketDataError};

pub use http::{HttpClient, HttpTransport, ReqwestTransport};

pub use rate_limit::{client_identifier, RateLimitOptions, RateLimitResult, RateLimiter};

pub use connectors::{
    ConnectionStatus, Connector, NormalizedHolding, PlaygroundTestResult, ProviderDescriptor,
    ProviderId, RunOptions, SupportLevel,
};

pub use registry::ConnectorRegistry;

pub use pricing::{AssetKind, AssetPrice, DexQuote, PriceBook, PriceResolver, SymbolPrice, TokenPrice};

use std::sync::Arc;

/// Build an [`HttpClient`] over `reqwest` with the configured timeout.
pub fn default_http_client(config: &AggregatorConfig) -> HttpClient {
    HttpClient::new(Arc::new(ReqwestTransport::new()), config.http_timeout)
}
