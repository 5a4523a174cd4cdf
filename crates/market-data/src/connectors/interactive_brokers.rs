//! Interactive Brokers connector.
//!
//! The Client Portal API needs a locally running, interactively authenticated
//! gateway, so there is nothing to probe from a server. Holdings can still be
//! brought in through Flex Query or CSV activity statements.

use async_trait::async_trait;

use super::{
    static_result, ConnectionStatus, Connector, PlaygroundTestResult, ProviderDescriptor,
    ProviderId, RunOptions, SupportLevel,
};

pub static DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    id: ProviderId::InteractiveBrokers,
    display_name: "Interactive Brokers",
    support: SupportLevel::Partial,
    capabilities: &["holdings_import"],
    requirements: &["Flex Query token and query id, or a CSV activity statement"],
    docs_url: "https://www.interactivebrokers.com/campus/ibkr-api-page/flex-web-service/",
};

pub struct InteractiveBrokersConnector;

#[async_trait]
impl Connector for InteractiveBrokersConnector {
    fn descriptor(&self) -> &'static ProviderDescriptor {
        &DESCRIPTOR
    }

    async fn run_test(&self, _options: &RunOptions) -> PlaygroundTestResult {
        static_result(
            &DESCRIPTOR,
            ConnectionStatus::Limited,
            &[
                "Live holdings need the Client Portal gateway, which cannot run headless.",
                "Export a Flex Query or CSV activity statement and use manual import instead.",
            ],
            None,
        )
    }
}
