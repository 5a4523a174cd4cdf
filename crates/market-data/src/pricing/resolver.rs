use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{CoinGeckoSource, DexQuote, DexScreenerSource, PriceBook, SymbolPrice, TokenPrice};
use crate::config::AggregatorConfig;
use crate::errors::MarketDataError;
use crate::http::{safe_error_message, HttpClient};

/// How an asset is priced.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    /// Ticker on the general price index (`ETH`, `BTC`).
    Crypto,
    /// On-chain token given as `chain:address`.
    Token,
    Equity,
    Cash,
    Other,
}

/// Price handed back to the price-refresh workflow.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AssetPrice {
    pub usd: f64,
    pub eur: Option<f64>,
}

/// Entry point for every pricing lookup.
#[derive(Clone)]
pub struct PriceResolver {
    coingecko: CoinGeckoSource,
    dexscreener: DexScreenerSource,
}

impl PriceResolver {
    pub fn new(config: &AggregatorConfig, http: HttpClient) -> Self {
        Self {
            coingecko: CoinGeckoSource::new(
                http.clone(),
                config.coingecko_base_url.clone(),
                config.coingecko_api_key.clone(),
            ),
            dexscreener: DexScreenerSource::new(http, config.dexscreener_base_url.clone()),
        }
    }

    pub async fn symbol_prices(
        &self,
        symbols: &[String],
    ) -> Result<PriceBook<SymbolPrice>, MarketDataError> {
        self.coingecko.fetch_symbol_prices(symbols).await
    }

    pub async fn token_prices(
        &self,
        mints: &[String],
    ) -> Result<PriceBook<TokenPrice>, MarketDataError> {
        self.dexscreener.fetch_token_prices(mints).await
    }

    pub async fn dex_price(
        &self,
        chain: &str,
        address: &str,
    ) -> Result<Option<DexQuote>, MarketDataError> {
        self.dexscreener.fetch_dex_price(chain, address).await
    }

    /// Current price of one asset, or `None` if it cannot be priced.
    ///
    /// Never fails: lookup errors are logged and reported as `None`.
    pub async fn fetch_asset_price(&self, symbol: &str, kind: AssetKind) -> Option<AssetPrice> {
        match kind {
            AssetKind::Crypto => {
                let symbol = symbol.trim().to_uppercase();
                match self.coingecko.fetch_symbol_prices(&[symbol.clone()]).await {
                    Ok(book) => book.get(&symbol).and_then(|price| {
                        Some(AssetPrice {
                            usd: price.usd?,
                            eur: price.eur,
                        })
                    }),
                    Err(error) => {
                        warn!("Price lookup for {} failed: {}", symbol, safe_error_message(&error));
                        None
                    }
                }
            }
            AssetKind::Token => {
                let Some((chain, address)) = symbol.split_once(':') else {
                    debug!("Token symbol {} is not in chain:address form", symbol);
                    return None;
                };
                match self.dexscreener.fetch_dex_price(chain, address).await {
                    Ok(quote) => quote.map(|quote| AssetPrice {
                        usd: quote.price_usd,
                        eur: None,
                    }),
                    Err(error) => {
                        warn!("Price lookup for {} failed: {}", symbol, safe_error_message(&error));
                        None
                    }
                }
            }
            AssetKind::Equity | AssetKind::Cash | AssetKind::Other => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::FakeTransport;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn resolver() -> (PriceResolver, Arc<FakeTransport>) {
        let transport = Arc::new(FakeTransport::new());
        let http = HttpClient::new(transport.clone(), Duration::from_secs(5));
        (PriceResolver::new(&AggregatorConfig::default(), http), transport)
    }

    #[tokio::test]
    async fn test_crypto_asset_price() {
        let (resolver, transport) = resolver();
        transport.push_json(200, json!({"ethereum": {"usd": 3000, "eur": 2750.5}}));

        let price = resolver.fetch_asset_price("eth", AssetKind::Crypto).await;

        assert_eq!(
            price,
            Some(AssetPrice {
                usd: 3000.0,
                eur: Some(2750.5)
            })
        );
        assert!(transport.requests()[0]
            .url
            .starts_with("https://api.coingecko.com/api/v3/simple/price"));
    }

    #[tokio::test]
    async fn test_token_asset_price() {
        let (resolver, transport) = resolver();
        transport.push_json(
            200,
            json!([{"priceUsd": "0.42", "liquidity": {"usd": 1000}, "pairAddress": "p"}]),
        );

        let price = resolver
            .fetch_asset_price("solana:So11111111111111111111111111111111111111112", AssetKind::Token)
            .await;

        assert_eq!(price, Some(AssetPrice { usd: 0.42, eur: None }));
        assert!(transport.requests()[0]
            .url
            .starts_with("https://api.dexscreener.com/token-pairs/v1/solana/"));
    }

    #[tokio::test]
    async fn test_unpriceable_assets() {
        let (resolver, transport) = resolver();
        assert!(resolver.fetch_asset_price("AAPL", AssetKind::Equity).await.is_none());
        assert!(resolver.fetch_asset_price("UNKNOWNCOIN", AssetKind::Crypto).await.is_none());
        assert!(resolver.fetch_asset_price("no-colon", AssetKind::Token).await.is_none());
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_is_none() {
        let (resolver, transport) = resolver();
        transport.push_json(503, json!({"error": "down"}));
        assert!(resolver.fetch_asset_price("BTC", AssetKind::Crypto).await.is_none());
    }
}
