//! Lookup table from [`ProviderId`] to [`Connector`].

use std::sync::Arc;

use log::{debug, info, warn};

use crate::config::AggregatorConfig;
use crate::connectors::{
    Connector, InteractiveBrokersConnector, PlaygroundTestResult, ProviderDescriptor, ProviderId,
    RevolutConnector, RunOptions, TradeRepublicConnector, Trading212Connector,
};
use crate::errors::MarketDataError;
use crate::http::HttpClient;

/// Registry of every known connector, built once at startup.
///
/// Unknown identifiers are rejected rather than mapped to a default.
pub struct ConnectorRegistry {
    connectors: Vec<(ProviderId, Arc<dyn Connector>)>,
}

impl ConnectorRegistry {
    /// Build the registry with one connector per [`ProviderId`].
    pub fn new(config: &AggregatorConfig, http: HttpClient) -> Self {
        Self::with_connectors(vec![
            Arc::new(Trading212Connector::new(http, config.trading212.clone())),
            Arc::new(InteractiveBrokersConnector),
            Arc::new(RevolutConnector),
            Arc::new(TradeRepublicConnector),
        ])
    }

    /// Build a registry from explicit connectors, keyed by their descriptors.
    ///
    /// A later connector with the same id replaces an earlier one.
    pub fn with_connectors(connectors: Vec<Arc<dyn Connector>>) -> Self {
        let mut entries: Vec<(ProviderId, Arc<dyn Connector>)> = Vec::new();
        for connector in connectors {
            let id = connector.descriptor().id;
            if let Some(slot) = entries.iter_mut().find(|(existing, _)| *existing == id) {
                warn!("Replacing duplicate connector registration for {}", id);
                slot.1 = connector;
            } else {
                entries.push((id, connector));
            }
        }
        debug!("Connector registry built with {} providers", entries.len());
        Self {
            connectors: entries,
        }
    }

    /// Whether `id` names a registered provider.
    pub fn is_valid_provider_id(&self, id: &str) -> bool {
        self.lookup(id).is_some()
    }

    /// Connector for `id`, or [`MarketDataError::UnknownProvider`].
    pub fn get_connector(&self, id: &str) -> Result<Arc<dyn Connector>, MarketDataError> {
        self.lookup(id)
            .ok_or_else(|| MarketDataError::UnknownProvider(id.chars().take(64).collect()))
    }

    /// Descriptors of every registered provider, in registration order.
    pub fn descriptors(&self) -> Vec<&'static ProviderDescriptor> {
        self.connectors
            .iter()
            .map(|(_, connector)| connector.descriptor())
            .collect()
    }

    /// Run the diagnostic test for `id` and return the client-facing result.
    ///
    /// Raw upstream records are stripped before returning.
    pub async fn run_test(
        &self,
        id: &str,
        options: &RunOptions,
    ) -> Result<PlaygroundTestResult, MarketDataError> {
        let connector = self.get_connector(id)?;
        let result = connector.run_test(options).await;
        info!(
            "Connector test for {}: connection={:?} auth={:?} holdings={} errors={}",
            result.provider_id,
            result.connection_status,
            result.auth_status,
            result.holdings.len(),
            result.errors.len()
        );
        Ok(result.sanitized())
    }

    fn lookup(&self, id: &str) -> Option<Arc<dyn Connector>> {
        let id: ProviderId = id.parse().ok()?;
        self.connectors
            .iter()
            .find(|(existing, _)| *existing == id)
            .map(|(_, connector)| Arc::clone(connector))
    }
}
