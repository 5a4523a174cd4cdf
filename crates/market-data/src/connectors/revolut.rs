//! Revolut connector.
//!
//! Revolut offers no public API for retail trading accounts. The connector
//! only reports that and points at statement import.

use async_trait::async_trait;

use super::{
    not_supported, static_result, ConnectionStatus, Connector, PlaygroundTestResult,
    ProviderDescriptor, ProviderId, RunOptions, SupportLevel,
};

pub static DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    id: ProviderId::Revolut,
    display_name: "Revolut",
    support: SupportLevel::Unsupported,
    capabilities: &[],
    requirements: &["Trading account statement exported as CSV"],
    docs_url: "https://help.revolut.com/help/wealth/stocks/",
};

pub struct RevolutConnector;

#[async_trait]
impl Connector for RevolutConnector {
    fn descriptor(&self) -> &'static ProviderDescriptor {
        &DESCRIPTOR
    }

    async fn run_test(&self, _options: &RunOptions) -> PlaygroundTestResult {
        static_result(
            &DESCRIPTOR,
            ConnectionStatus::NotSupported,
            &["Download the trading account statement as CSV and use manual import."],
            Some(not_supported(
                &DESCRIPTOR,
                "there is no public holdings API for retail accounts",
            )),
        )
    }
}
