//! CoinGecko simple-price source for ticker lookups.
//!
//! API documentation: https://docs.coingecko.com/reference/simple-price

use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::validation::validate_symbols;
use super::PriceBook;
use crate::errors::MarketDataError;
use crate::http::{extract_error_message, read_response_body, HttpClient, HttpRequest};

const PROVIDER_ID: &str = "COINGECKO";

/// Quote currencies requested for every symbol.
const VS_CURRENCIES: &str = "usd,eur";

lazy_static! {
    /// Ticker to CoinGecko coin id.
    static ref SYMBOL_IDS: HashMap<&'static str, &'static str> = HashMap::from([
        ("BTC", "bitcoin"),
        ("ETH", "ethereum"),
        ("SOL", "solana"),
        ("USDC", "usd-coin"),
        ("USDT", "tether"),
        ("DAI", "dai"),
        ("BNB", "binancecoin"),
        ("XRP", "ripple"),
        ("ADA", "cardano"),
        ("DOGE", "dogecoin"),
        ("DOT", "polkadot"),
        ("MATIC", "matic-network"),
        ("POL", "polygon-ecosystem-token"),
        ("AVAX", "avalanche-2"),
        ("LINK", "chainlink"),
        ("LTC", "litecoin"),
        ("BCH", "bitcoin-cash"),
        ("TRX", "tron"),
        ("ATOM", "cosmos"),
        ("XLM", "stellar"),
        ("UNI", "uniswap"),
        ("NEAR", "near"),
        ("ARB", "arbitrum"),
        ("OP", "optimism"),
        ("TON", "the-open-network"),
        ("SHIB", "shiba-inu"),
        ("JUP", "jupiter-exchange-solana"),
        ("BONK", "bonk"),
        ("WIF", "dogwifcoin"),
        ("PYTH", "pyth-network"),
    ]);
}

/// CoinGecko coin id for a ticker, if known.
pub fn coingecko_id(symbol: &str) -> Option<&'static str> {
    SYMBOL_IDS.get(symbol.trim().to_uppercase().as_str()).copied()
}

/// Price of one symbol in the requested quote currencies.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SymbolPrice {
    pub usd: Option<f64>,
    pub eur: Option<f64>,
    #[serde(rename = "change24h")]
    pub change_24h: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SimplePrice {
    usd: Option<f64>,
    eur: Option<f64>,
    usd_24h_change: Option<f64>,
}

/// Client for the CoinGecko `/simple/price` endpoint.
#[derive(Clone)]
pub struct CoinGeckoSource {
    http: HttpClient,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoSource {
    pub fn new(http: HttpClient, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key,
        }
    }

    /// Resolve `symbols` with one batched upstream call.
    ///
    /// Symbols without a known coin id are dropped silently. When none are
    /// known no call is made and the result is empty. Keys are the
    /// uppercased input symbols in request order.
    pub async fn fetch_symbol_prices(
        &self,
        symbols: &[String],
    ) -> Result<PriceBook<SymbolPrice>, MarketDataError> {
        let symbols = validate_symbols(symbols)?;

        let mapped: Vec<(String, &'static str)> = symbols
            .into_iter()
            .filter_map(|symbol| coingecko_id(&symbol).map(|id| (symbol, id)))
            .collect();

        if mapped.is_empty() {
            debug!("No requested symbol maps to a CoinGecko id");
            return Ok(PriceBook::new());
        }

        let mut ids: Vec<&'static str> = Vec::with_capacity(mapped.len());
        for (_, id) in &mapped {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }

        let url = format!(
            "{}/simple/price?ids={}&vs_currencies={}&include_24hr_change=true",
            self.base_url,
            urlencoding::encode(&ids.join(",")),
            VS_CURRENCIES
        );
        let mut request = HttpRequest::get(url).header("Accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("x-cg-demo-api-key", key.as_str());
        }

        let response = self.http.fetch(request).await?;
        let body = read_response_body(&response);

        if !response.is_success() {
            let message = body.as_ref().and_then(extract_error_message);
            warn!(status = response.status, "CoinGecko price request failed");
            return Err(MarketDataError::from_status(
                PROVIDER_ID,
                response.status,
                message,
            ));
        }

        let body = body.ok_or_else(|| {
            MarketDataError::Decode("CoinGecko returned an unreadable body".to_string())
        })?;
        let prices: HashMap<String, SimplePrice> = serde_json::from_value(body)
            .map_err(|e| MarketDataError::Decode(format!("CoinGecko price payload: {}", e)))?;

        let mut book = PriceBook::new();
        for (symbol, id) in mapped {
            let Some(price) = prices.get(id) else {
                continue;
            };
            if price.usd.is_none() && price.eur.is_none() {
                continue;
            }
            book.insert(
                symbol,
                SymbolPrice {
                    usd: price.usd,
                    eur: price.eur,
                    change_24h: price.usd_24h_change,
                },
            );
        }

        debug!(resolved = book.len(), requested = ids.len(), "CoinGecko prices resolved");
        Ok(book)
    }
}
