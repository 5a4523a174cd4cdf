//! Connector registry module.
//!
//! Maps provider identifiers to connector instances. Adding a provider means
//! one connector implementation and one entry in
//! [`ConnectorRegistry::new`]; nothing else changes.

mod connector_registry;

pub use connector_registry::ConnectorRegistry;
