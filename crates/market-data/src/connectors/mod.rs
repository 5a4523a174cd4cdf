//! Brokerage connector abstractions and implementations.
//!
//! This module contains:
//! - The [`Connector`] trait every provider implements
//! - Shared result and holding models
//! - Authorization-style candidates and row normalization helpers
//! - One connector per provider
//!
//! # Contract
//!
//! A connector exposes a static [`ProviderDescriptor`] and a diagnostic
//! [`Connector::run_test`] that never fails: every error is folded into the
//! returned [`PlaygroundTestResult`]. Providers without a public holdings API
//! answer from their descriptor alone and make no network call.

pub mod auth;
mod models;
pub mod normalize;

pub mod interactive_brokers;
pub mod revolut;
pub mod trade_republic;
pub mod trading212;

pub use interactive_brokers::InteractiveBrokersConnector;
pub use models::{
    ConnectionStatus, NormalizedHolding, PlaygroundTestResult, ProviderDescriptor, ProviderId,
    RunOptions, SupportLevel,
};
pub use revolut::RevolutConnector;
pub use trade_republic::TradeRepublicConnector;
pub use trading212::Trading212Connector;

use async_trait::async_trait;

use crate::errors::MarketDataError;

/// A provider-specific holdings probe.
///
/// Implement this trait and add one registry entry to support a new provider.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Static metadata for this provider.
    fn descriptor(&self) -> &'static ProviderDescriptor;

    /// Probe the provider and normalize whatever holdings it returns.
    ///
    /// The returned result still carries raw upstream records; callers
    /// outside the core should use [`PlaygroundTestResult::sanitized`].
    async fn run_test(&self, options: &RunOptions) -> PlaygroundTestResult;
}

/// Result for a provider that has no usable integration path.
///
/// Both statuses are set to `status`, holdings are empty and no network call
/// is made. A `failure` is folded in with [`PlaygroundTestResult::with_failure`].
pub(crate) fn static_result(
    descriptor: &'static ProviderDescriptor,
    status: ConnectionStatus,
    warnings: &[&str],
    failure: Option<MarketDataError>,
) -> PlaygroundTestResult {
    let mut result = PlaygroundTestResult::new(descriptor, status);
    result.warnings = warnings.iter().map(|w| w.to_string()).collect();
    if let Some(error) = failure {
        result = result.with_failure(&error);
    }
    result.finish()
}

/// A [`MarketDataError::NotSupported`] for `descriptor`'s provider.
pub(crate) fn not_supported(descriptor: &ProviderDescriptor, reason: &str) -> MarketDataError {
    MarketDataError::NotSupported {
        provider: descriptor.display_name.to_string(),
        message: reason.to_string(),
    }
}
