//! Price resolution.
//!
//! Two independent paths share one pattern, "ask the primary source and
//! degrade gracefully":
//!
//! - Symbol-indexed: tickers are mapped to CoinGecko ids and resolved in a
//!   single batched call ([`CoinGeckoSource`]).
//! - Address-indexed: contract or mint addresses are resolved one by one
//!   against DexScreener, keeping the most liquid pair ([`DexScreenerSource`]).
//!
//! All inputs pass through [`validation`] before any upstream call.

mod book;
mod coingecko;
mod dexscreener;
mod resolver;
pub mod validation;

pub use book::PriceBook;
pub use coingecko::{coingecko_id, CoinGeckoSource, SymbolPrice};
pub use dexscreener::{select_best_pair, DexPair, DexQuote, DexScreenerSource, TokenPrice};
pub use resolver::{AssetKind, AssetPrice, PriceResolver};
