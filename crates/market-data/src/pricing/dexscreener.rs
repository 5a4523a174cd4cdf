//! DexScreener source for on-chain token prices.
//!
//! Each address is resolved with its own request against
//! `/token-pairs/v1/{chain}/{address}`. The upstream allows roughly 300
//! requests per minute, so batches are paced and capped.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::validation::{validate_address, validate_addresses, validate_chain};
use super::PriceBook;
use crate::connectors::normalize::{number_from, rows_of};
use crate::errors::MarketDataError;
use crate::http::{
    extract_error_message, read_response_body, safe_error_message, HttpClient, HttpRequest,
};

const PROVIDER_ID: &str = "DEXSCREENER";

/// Chain used for mint lookups.
pub const SOLANA_CHAIN: &str = "solana";

/// Addresses processed per batch call; the rest are ignored.
pub const DEX_BATCH_LIMIT: usize = 10;

/// Delay inserted between consecutive upstream requests in a batch.
pub const PACING_DELAY: Duration = Duration::from_millis(150);

/// One trading pair as reported by the aggregator.
///
/// Numeric fields are parsed leniently: DexScreener sends prices as strings
/// and liquidity as numbers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DexPair {
    pub price_usd: Option<f64>,
    pub price_native: Option<f64>,
    pub liquidity_usd: Option<f64>,
    pub pair_address: Option<String>,
    pub dex_id: Option<String>,
}

impl DexPair {
    pub fn from_value(value: &Value) -> Self {
        let text = |field: &str| {
            value
                .get(field)
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        Self {
            price_usd: value.get("priceUsd").and_then(number_from),
            price_native: value.get("priceNative").and_then(number_from),
            liquidity_usd: value
                .get("liquidity")
                .and_then(|l| l.get("usd"))
                .and_then(number_from),
            pair_address: text("pairAddress"),
            dex_id: text("dexId"),
        }
    }
}

/// The pair with the greatest USD liquidity.
///
/// Missing liquidity counts as zero. Only a strictly greater liquidity
/// replaces the current best, so the first pair wins ties. The price is read
/// from the chosen pair afterwards; a most-liquid pair without a USD price
/// leaves the token unpriced.
pub fn select_best_pair(pairs: &[DexPair]) -> Option<&DexPair> {
    pairs
        .iter()
        .fold(None, |best: Option<&DexPair>, pair| match best {
            Some(current)
                if pair.liquidity_usd.unwrap_or(0.0) > current.liquidity_usd.unwrap_or(0.0) =>
            {
                Some(pair)
            }
            Some(current) => Some(current),
            None => Some(pair),
        })
}

/// Price of one mint in a batch lookup.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPrice {
    pub price_usd: f64,
    pub liquidity_usd: Option<f64>,
    pub pair_address: Option<String>,
    pub dex_id: Option<String>,
}

/// Quote for a single chain/address lookup.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DexQuote {
    pub chain: String,
    pub address: String,
    pub price_usd: f64,
    pub price_native: Option<f64>,
    pub liquidity_usd: Option<f64>,
    pub pair_address: Option<String>,
    pub dex_id: Option<String>,
}

/// Client for the DexScreener token-pairs endpoint.
#[derive(Clone)]
pub struct DexScreenerSource {
    http: HttpClient,
    base_url: String,
}

impl DexScreenerSource {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    async fn fetch_pairs(&self, chain: &str, address: &str) -> Result<Vec<DexPair>, MarketDataError> {
        let url = format!(
            "{}/token-pairs/v1/{}/{}",
            self.base_url,
            urlencoding::encode(chain),
            urlencoding::encode(address)
        );
        let response = self
            .http
            .fetch(HttpRequest::get(url).header("Accept", "application/json"))
            .await?;
        let body = read_response_body(&response);

        if !response.is_success() {
            let message = body.as_ref().and_then(extract_error_message);
            return Err(MarketDataError::from_status(
                PROVIDER_ID,
                response.status,
                message,
            ));
        }

        let body = body.ok_or_else(|| {
            MarketDataError::Decode("DexScreener returned an unreadable body".to_string())
        })?;
        let rows = rows_of(&body, &["pairs"]).ok_or_else(|| {
            MarketDataError::Decode("DexScreener payload has no pair list".to_string())
        })?;
        Ok(rows.iter().map(DexPair::from_value).collect())
    }

    async fn best_pair(&self, chain: &str, address: &str) -> Option<DexPair> {
        match self.fetch_pairs(chain, address).await {
            Ok(pairs) => {
                let best = select_best_pair(&pairs).cloned();
                if best.is_none() {
                    debug!(chain, address, "No pairs found");
                }
                best
            }
            Err(error) => {
                warn!(chain, address, "DexScreener lookup failed: {}", safe_error_message(&error));
                None
            }
        }
    }

    /// Price Solana mints from their most liquid pairs.
    ///
    /// At most [`DEX_BATCH_LIMIT`] mints are looked up, sequentially, with
    /// [`PACING_DELAY`] between requests. Mints that fail, or whose most
    /// liquid pair has no USD price, are left out of the result.
    pub async fn fetch_token_prices(
        &self,
        mints: &[String],
    ) -> Result<PriceBook<TokenPrice>, MarketDataError> {
        let mints = validate_addresses(mints)?;
        if mints.len() > DEX_BATCH_LIMIT {
            debug!(
                requested = mints.len(),
                "Only the first {} mints are priced per request", DEX_BATCH_LIMIT
            );
        }

        let mut book = PriceBook::new();
        for (index, mint) in mints.iter().take(DEX_BATCH_LIMIT).enumerate() {
            if index > 0 {
                tokio::time::sleep(PACING_DELAY).await;
            }
            let Some(pair) = self.best_pair(SOLANA_CHAIN, mint).await else {
                continue;
            };
            let Some(price_usd) = pair.price_usd else {
                continue;
            };
            book.insert(
                mint.as_str(),
                TokenPrice {
                    price_usd,
                    liquidity_usd: pair.liquidity_usd,
                    pair_address: pair.pair_address,
                    dex_id: pair.dex_id,
                },
            );
        }
        Ok(book)
    }

    /// Price one token on `chain` from its most liquid pair.
    ///
    /// Returns `Ok(None)` when the lookup fails or the most liquid pair has
    /// no USD price; only invalid input is an error.
    pub async fn fetch_dex_price(
        &self,
        chain: &str,
        address: &str,
    ) -> Result<Option<DexQuote>, MarketDataError> {
        let chain = validate_chain(chain)?;
        let address = address.trim();
        validate_address(address)?;

        let quote = self.best_pair(&chain, address).await.and_then(|pair| {
            Some(DexQuote {
                price_usd: pair.price_usd?,
                price_native: pair.price_native,
                liquidity_usd: pair.liquidity_usd,
                pair_address: pair.pair_address,
                dex_id: pair.dex_id,
                chain: chain.clone(),
                address: address.to_string(),
            })
        });
        Ok(quote)
    }
}
