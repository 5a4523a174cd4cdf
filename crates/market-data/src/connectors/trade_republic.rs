//! Trade Republic connector.
//!
//! Trade Republic exposes only a private, app-bound interface that requires
//! device pairing. Nothing is probed; users import statements instead.

use async_trait::async_trait;

use super::{
    not_supported, static_result, ConnectionStatus, Connector, PlaygroundTestResult,
    ProviderDescriptor, ProviderId, RunOptions, SupportLevel,
};

pub static DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    id: ProviderId::TradeRepublic,
    display_name: "Trade Republic",
    support: SupportLevel::Unsupported,
    capabilities: &[],
    requirements: &["Account statement or transaction export (PDF/CSV)"],
    docs_url: "https://support.traderepublic.com/",
};

pub struct TradeRepublicConnector;

#[async_trait]
impl Connector for TradeRepublicConnector {
    fn descriptor(&self) -> &'static ProviderDescriptor {
        &DESCRIPTOR
    }

    async fn run_test(&self, _options: &RunOptions) -> PlaygroundTestResult {
        static_result(
            &DESCRIPTOR,
            ConnectionStatus::NotSupported,
            &[
                "Unofficial clients need device pairing and break without notice.",
                "Export your transactions and use manual import instead.",
            ],
            Some(not_supported(&DESCRIPTOR, "there is no official API")),
        )
    }
}
