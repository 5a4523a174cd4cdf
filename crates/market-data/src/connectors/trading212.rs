//! Trading 212 connector.
//!
//! Reads open positions from the public equity API (`/equity/portfolio`).
//! The API has accepted the key as a raw `Authorization` value, as a bearer
//! token and, for key/secret pairs, as HTTP Basic; the connector tries the
//! applicable encodings in order. API documentation:
//! https://t212public-api-docs.redoc.ly/

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::auth::candidate_headers;
use super::normalize::{normalize_row, rows_of, FieldMap};
use super::{
    ConnectionStatus, Connector, NormalizedHolding, PlaygroundTestResult, ProviderDescriptor,
    ProviderId, RunOptions, SupportLevel,
};
use crate::config::Trading212Settings;
use crate::errors::MarketDataError;
use crate::http::{
    extract_error_message, read_response_body, safe_error_message, HttpClient, HttpRequest,
    HttpResponse,
};

const PROVIDER_NAME: &str = "Trading 212";

const PORTFOLIO_PATH: &str = "/equity/portfolio";

/// Instrument-type suffixes appended to Trading 212 tickers.
const TICKER_SUFFIXES: &[&str] = &["_EQ", "_ETF", "_CFD", "_FUND", "_ADR", "_TR"];

pub static DESCRIPTOR: ProviderDescriptor = ProviderDescriptor {
    id: ProviderId::Trading212,
    display_name: "Trading 212",
    support: SupportLevel::Supported,
    capabilities: &["holdings"],
    requirements: &["API key generated in Trading 212 settings (read-only scope)"],
    docs_url: "https://t212public-api-docs.redoc.ly/",
};

const FIELDS: FieldMap = FieldMap {
    id: &["ticker", "id"],
    symbol: &["ticker", "symbol"],
    name: &["name", "shortName"],
    quantity: &["quantity", "qty", "shares", "units"],
    unit_price: &["currentPrice", "price", "unitPrice"],
    market_value: &["marketValue", "value", "currentValue"],
    currency: &["currency", "currencyCode"],
};

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Outcome of the auth-style loop.
struct Probe {
    /// Label of the last style tried.
    style: &'static str,
    tried: usize,
    result: Result<HttpResponse, MarketDataError>,
}

/// Connector for the Trading 212 public API.
pub struct Trading212Connector {
    http: HttpClient,
    settings: Trading212Settings,
}

impl Trading212Connector {
    pub fn new(http: HttpClient, settings: Trading212Settings) -> Self {
        Self { http, settings }
    }

    /// Turn a Trading 212 instrument code into a display symbol.
    ///
    /// `AAPL_US_EQ` becomes `AAPL`; a lowercase exchange marker such as the
    /// `l` in `VODl_EQ` becomes a market suffix (`VOD.L`).
    pub fn display_symbol(ticker: &str) -> String {
        let mut base = ticker.trim();
        if let Some(stripped) = TICKER_SUFFIXES.iter().find_map(|s| base.strip_suffix(s)) {
            base = stripped;
        }

        if let Some(pos) = base.find("_US") {
            return base[..pos].to_uppercase();
        }

        let symbol: String = base
            .chars()
            .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '.')
            .collect();
        let suffix = match base.chars().find(|c| c.is_ascii_lowercase()) {
            Some('a') => ".AS",
            Some('l') => ".L",
            Some('d') => ".DE",
            Some('m') => ".MI",
            Some('p') => ".PA",
            Some('h') => ".HK",
            Some('t') => ".TO",
            Some('v') => ".V",
            Some('o') => ".OL",
            Some('s') => ".SG",
            _ => "",
        };

        if symbol.is_empty() {
            base.to_uppercase()
        } else {
            format!("{}{}", symbol, suffix)
        }
    }

    /// Try each authorization encoding until one is not rejected with 401/403.
    async fn probe(&self, url: &str, credential: &str) -> Probe {
        let mut probe = Probe {
            style: "none",
            tried: 0,
            result: Err(MarketDataError::Validation(
                "no authorization style applies to this credential".to_string(),
            )),
        };

        for (style, header) in candidate_headers(credential) {
            let request = HttpRequest::get(url)
                .header("Authorization", header)
                .header("Accept", "application/json");

            probe.style = style.name;
            probe.tried += 1;
            probe.result = self.http.fetch(request).await;

            match &probe.result {
                Ok(response) if matches!(response.status, 401 | 403) => {
                    debug!(
                        style = style.name,
                        status = response.status,
                        "Trading 212 rejected auth style, trying next"
                    );
                }
                _ => break,
            }
        }

        probe
    }

    fn normalize_holdings(
        &self,
        body: &Value,
        default_currency: &str,
    ) -> Option<Vec<NormalizedHolding>> {
        let rows = rows_of(body, &["items", "positions", "data"])?;
        Some(
            rows.iter()
                .filter_map(|row| {
                    normalize_row(
                        row,
                        &FIELDS,
                        default_currency,
                        "equity",
                        "broker_api",
                        Self::display_symbol,
                    )
                })
                .collect(),
        )
    }
}

#[async_trait]
impl Connector for Trading212Connector {
    fn descriptor(&self) -> &'static ProviderDescriptor {
        &DESCRIPTOR
    }

    async fn run_test(&self, options: &RunOptions) -> PlaygroundTestResult {
        let override_key = non_blank(options.api_key.as_deref());
        let override_url = non_blank(options.base_url.as_deref());

        let Some(credential) = override_key.or(non_blank(self.settings.api_key.as_deref())) else {
            info!("Trading 212 test skipped: no API key configured");
            let error = MarketDataError::NotConfigured {
                provider: PROVIDER_NAME.to_string(),
                message: "set TRADING212_API_KEY or provide a key for this test".to_string(),
            };
            let mut result =
                PlaygroundTestResult::new(&DESCRIPTOR, ConnectionStatus::NotConfigured)
                    .with_failure(&error);
            result.raw_summary = Some(json!({ "configured": false }));
            return result.finish();
        };

        let mut summary = json!({
            "configured": true,
            "endpoint": PORTFOLIO_PATH,
            "authStyle": Value::Null,
            "attempts": 0,
            "status": Value::Null,
            "holdingsCount": 0,
        });

        // The configured key only ever goes to the configured host.
        if override_url.is_some() && override_key.is_none() {
            warn!("Trading 212 test rejected: base URL override without an API key");
            let error = MarketDataError::Validation(
                "A custom base URL requires an API key supplied for the same test.".to_string(),
            );
            let mut result =
                PlaygroundTestResult::new(&DESCRIPTOR, ConnectionStatus::Error).with_failure(&error);
            result.raw_summary = Some(summary);
            return result.finish();
        }

        let base_url = override_url
            .unwrap_or(&self.settings.base_url)
            .trim_end_matches('/');
        let default_currency = non_blank(options.default_currency.as_deref())
            .unwrap_or(&self.settings.default_currency)
            .to_uppercase();

        let url = format!("{}{}", base_url, PORTFOLIO_PATH);
        let probe = self.probe(&url, credential).await;
        summary["authStyle"] = json!(probe.style);
        summary["attempts"] = json!(probe.tried);

        let mut result = PlaygroundTestResult::new(&DESCRIPTOR, ConnectionStatus::Ok);

        match probe.result {
            Err(error) => {
                warn!("Trading 212 test failed: {}", safe_error_message(&error));
                result = result.with_failure(&error);
            }
            Ok(response) if !response.is_success() => {
                summary["status"] = json!(response.status);
                let upstream = read_response_body(&response)
                    .as_ref()
                    .and_then(extract_error_message);
                let error = MarketDataError::from_status(PROVIDER_NAME, response.status, upstream);
                warn!(
                    status = response.status,
                    "Trading 212 returned an error: {}",
                    safe_error_message(&error)
                );
                result = result.with_failure(&error);
            }
            Ok(response) => {
                summary["status"] = json!(response.status);
                let holdings = read_response_body(&response)
                    .as_ref()
                    .and_then(|b| self.normalize_holdings(b, &default_currency));

                match holdings {
                    Some(holdings) => {
                        if holdings.is_empty() {
                            result = result.with_warning(
                                "Connected to Trading 212, but no open positions were returned.",
                            );
                        }
                        summary["holdingsCount"] = json!(holdings.len());
                        info!(count = holdings.len(), "Trading 212 holdings fetched");
                        result.holdings = holdings;
                    }
                    None => {
                        let error = MarketDataError::Decode(
                            "Trading 212 holdings payload has no position list".to_string(),
                        );
                        result = result.with_error(safe_error_message(&error));
                    }
                }
            }
        }

        result.raw_summary = Some(summary);
        result.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_TRADING212_BASE_URL;
    use crate::errors::TIMEOUT_MESSAGE;
    use crate::http::testing::FakeTransport;
    use std::sync::Arc;
    use std::time::Duration;

    fn connector(api_key: Option<&str>) -> (Trading212Connector, Arc<FakeTransport>) {
        let transport = Arc::new(FakeTransport::new());
        let http = HttpClient::new(transport.clone(), Duration::from_secs(5));
        let settings = Trading212Settings {
            api_key: api_key.map(str::to_string),
            base_url: DEFAULT_TRADING212_BASE_URL.to_string(),
            default_currency: "EUR".to_string(),
        };
        (Trading212Connector::new(http, settings), transport)
    }

    #[test]
    fn test_display_symbol() {
        assert_eq!(Trading212Connector::display_symbol("AAPL_US_EQ"), "AAPL");
        assert_eq!(Trading212Connector::display_symbol("VODl_EQ"), "VOD.L");
        assert_eq!(Trading212Connector::display_symbol("SAPd_EQ"), "SAP.DE");
        assert_eq!(Trading212Connector::display_symbol("plain"), "PLAIN");
    }

    #[tokio::test]
    async fn test_not_configured_makes_no_call() {
        let (connector, transport) = connector(None);
        let result = connector.run_test(&RunOptions::default()).await;

        assert_eq!(result.connection_status, ConnectionStatus::NotConfigured);
        assert_eq!(result.auth_status, ConnectionStatus::NotConfigured);
        assert!(result.holdings.is_empty());
        assert!(result.errors[0].starts_with("Trading 212 is not configured"));
        assert!(result.errors[0].contains("TRADING212_API_KEY"));
        assert_eq!(result.errors.len(), 1);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_blank_override_is_not_a_credential() {
        let (connector, transport) = connector(None);
        let options = RunOptions {
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        let result = connector.run_test(&options).await;
        assert_eq!(result.auth_status, ConnectionStatus::NotConfigured);
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_success_normalizes_holdings() {
        let (connector, transport) = connector(Some("key-1"));
        transport.push_json(
            200,
            json!([
                {"ticker": "AAPL_US_EQ", "quantity": 3, "currentPrice": 190.5},
                {"ticker": "TSLA_US_EQ", "quantity": 0, "currentPrice": 250},
                {"ticker": "VODl_EQ", "quantity": "10.5", "currentPrice": 0.7, "currency": "gbp"}
            ]),
        );

        let result = connector.run_test(&RunOptions::default()).await;

        assert_eq!(result.connection_status, ConnectionStatus::Ok);
        assert_eq!(result.auth_status, ConnectionStatus::Ok);
        assert!(result.errors.is_empty());
        assert_eq!(result.holdings.len(), 2);

        let aapl = &result.holdings[0];
        assert_eq!(aapl.symbol, "AAPL");
        assert_eq!(aapl.external_id, "AAPL_US_EQ");
        assert_eq!(aapl.currency, "EUR");
        assert_eq!(aapl.market_value, Some(571.5));
        assert!(aapl.raw.is_some());

        let vod = &result.holdings[1];
        assert_eq!(vod.symbol, "VOD.L");
        assert_eq!(vod.quantity, 10.5);
        assert_eq!(vod.currency, "GBP");

        let summary = result.raw_summary.unwrap();
        assert_eq!(summary["status"], 200);
        assert_eq!(summary["authStyle"], "raw");
        assert_eq!(summary["holdingsCount"], 2);
        assert!(!summary.to_string().contains("key-1"));

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].url,
            format!("{}/equity/portfolio", DEFAULT_TRADING212_BASE_URL)
        );
        assert_eq!(sent[0].header_value("authorization"), Some("key-1"));
    }

    #[tokio::test]
    async fn test_falls_through_auth_styles() {
        let (connector, transport) = connector(Some("key-1"));
        transport.push_json(401, json!({"message": "Bad key"}));
        transport.push_json(200, json!([{"ticker": "AAPL_US_EQ", "quantity": 1}]));

        let result = connector.run_test(&RunOptions::default()).await;

        assert_eq!(result.auth_status, ConnectionStatus::Ok);
        assert_eq!(result.holdings.len(), 1);
        let sent = transport.requests();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].header_value("authorization"), Some("Bearer key-1"));
        assert_eq!(result.raw_summary.unwrap()["authStyle"], "bearer");
    }

    #[tokio::test]
    async fn test_all_styles_rejected() {
        let (connector, transport) = connector(Some("key-1"));
        transport.push_json(401, json!({"message": "Bad key"}));
        transport.push_json(403, json!({"message": "Forbidden"}));

        let result = connector.run_test(&RunOptions::default()).await;

        assert_eq!(result.connection_status, ConnectionStatus::Ok);
        assert_eq!(result.auth_status, ConnectionStatus::Error);
        assert!(result.holdings.is_empty());
        assert_eq!(
            result.errors,
            vec!["Trading 212 rejected the credential (HTTP 403)".to_string()]
        );
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_rate_limited_is_reachable_and_authorized() {
        let (connector, transport) = connector(Some("key-1"));
        transport.push_json(429, json!({"message": "Too many"}));

        let result = connector.run_test(&RunOptions::default()).await;

        assert_eq!(result.connection_status, ConnectionStatus::Ok);
        assert_eq!(result.auth_status, ConnectionStatus::Ok);
        assert_eq!(result.errors, vec!["Rate limited: Trading 212".to_string()]);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_server_error_extracts_message() {
        let (connector, transport) = connector(Some("key-1"));
        transport.push_json(500, json!({"error": "maintenance, Bearer abc.def-123"}));

        let result = connector.run_test(&RunOptions::default()).await;

        assert_eq!(result.connection_status, ConnectionStatus::Error);
        assert_eq!(result.auth_status, ConnectionStatus::Error);
        assert!(result.errors[0].contains("maintenance"));
        assert!(!result.errors[0].contains("abc.def-123"));
    }

    #[tokio::test]
    async fn test_timeout_uses_fixed_message() {
        let (connector, transport) = connector(Some("key-1"));
        transport.push_error(MarketDataError::Timeout);

        let result = connector.run_test(&RunOptions::default()).await;

        assert_eq!(result.connection_status, ConnectionStatus::Error);
        assert_eq!(result.errors, vec![TIMEOUT_MESSAGE.to_string()]);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_portfolio_is_a_warning() {
        let (connector, transport) = connector(Some("key-1"));
        transport.push_json(200, json!([]));

        let result = connector.run_test(&RunOptions::default()).await;

        assert_eq!(result.auth_status, ConnectionStatus::Ok);
        assert!(result.errors.is_empty());
        assert_eq!(result.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_unexpected_payload() {
        let (connector, transport) = connector(Some("key-1"));
        transport.push_text(200, "<html>maintenance</html>");

        let result = connector.run_test(&RunOptions::default()).await;

        assert!(result.holdings.is_empty());
        assert_eq!(result.auth_status, ConnectionStatus::Ok);
        assert!(result.errors[0].starts_with("Unexpected response"));
    }

    #[tokio::test]
    async fn test_run_options_override_settings() {
        let (connector, transport) = connector(None);
        transport.push_json(200, json!({"items": [{"ticker": "AAPL_US_EQ", "quantity": 1}]}));
        let options = RunOptions {
            api_key: Some("k:s".to_string()),
            base_url: Some("https://demo.trading212.com/api/v0/".to_string()),
            default_currency: Some("usd".to_string()),
        };

        let result = connector.run_test(&options).await;

        let sent = transport.requests();
        assert_eq!(sent[0].url, "https://demo.trading212.com/api/v0/equity/portfolio");
        assert_eq!(
            sent[0].header_value("authorization"),
            Some("Basic azpz")
        );
        assert_eq!(result.holdings[0].currency, "USD");
    }

    #[tokio::test]
    async fn test_configured_key_never_goes_to_overridden_url() {
        let (connector, transport) = connector(Some("operator-secret"));
        let options = RunOptions {
            base_url: Some("https://attacker.example".to_string()),
            ..Default::default()
        };

        let result = connector.run_test(&options).await;

        assert_eq!(transport.call_count(), 0);
        assert_eq!(result.connection_status, ConnectionStatus::Error);
        assert_eq!(result.auth_status, ConnectionStatus::Error);
        assert!(result.errors[0].contains("custom base URL"));
        assert!(!serde_json::to_string(&result)
            .unwrap()
            .contains("operator-secret"));
    }

    #[tokio::test]
    async fn test_overridden_url_uses_supplied_key_only() {
        let (connector, transport) = connector(Some("operator-secret"));
        transport.push_json(200, json!([]));
        let options = RunOptions {
            api_key: Some("caller-key".to_string()),
            base_url: Some("https://demo.trading212.com/api/v0".to_string()),
            ..Default::default()
        };

        connector.run_test(&options).await;

        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "https://demo.trading212.com/api/v0/equity/portfolio");
        assert_eq!(sent[0].header_value("authorization"), Some("caller-key"));
    }

    #[tokio::test]
    async fn test_blank_url_override_keeps_configured_host() {
        let (connector, transport) = connector(Some("operator-secret"));
        transport.push_json(200, json!([]));
        let options = RunOptions {
            base_url: Some("  ".to_string()),
            ..Default::default()
        };

        let result = connector.run_test(&options).await;

        assert_eq!(result.auth_status, ConnectionStatus::Ok);
        assert_eq!(
            transport.requests()[0].url,
            format!("{}/equity/portfolio", DEFAULT_TRADING212_BASE_URL)
        );
    }
}
