use std::sync::Arc;

use axum::{
    extract::{Query, State},
    middleware,
    routing::get,
    Json, Router,
};
use folio_market_data::{
    pricing::validation::parse_list, DexQuote, PriceBook, SymbolPrice, TokenPrice,
};
use serde::Deserialize;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
    rate_limit::{
        enforce_rate_limit, RouteLimit, SCOPE_DEX_PRICE, SCOPE_SYMBOL_PRICES, SCOPE_TOKEN_PRICES,
    },
};

#[derive(Deserialize)]
struct SymbolsQuery {
    symbols: Option<String>,
}

async fn get_symbol_prices(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SymbolsQuery>,
) -> ApiResult<Json<PriceBook<SymbolPrice>>> {
    let symbols = parse_list(query.symbols.as_deref().unwrap_or_default());
    let prices = state.prices.symbol_prices(&symbols).await?;
    Ok(Json(prices))
}

#[derive(Deserialize)]
struct MintsQuery {
    mints: Option<String>,
}

async fn get_token_prices(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MintsQuery>,
) -> ApiResult<Json<PriceBook<TokenPrice>>> {
    let mints = parse_list(query.mints.as_deref().unwrap_or_default());
    let prices = state.prices.token_prices(&mints).await?;
    Ok(Json(prices))
}

#[derive(Deserialize)]
struct DexQuery {
    chain: Option<String>,
    address: Option<String>,
}

async fn get_dex_price(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DexQuery>,
) -> ApiResult<Json<DexQuote>> {
    let quote = state
        .prices
        .dex_price(
            query.chain.as_deref().unwrap_or_default(),
            query.address.as_deref().unwrap_or_default(),
        )
        .await?;
    quote.map(Json).ok_or(ApiError::NotFound)
}

pub fn router(state: &AppState) -> Router<Arc<AppState>> {
    let limit = |scope| {
        middleware::from_fn_with_state(
            RouteLimit::new(state.limiter.clone(), scope, state.prices_limit),
            enforce_rate_limit,
        )
    };

    Router::new()
        .route(
            "/prices",
            get(get_symbol_prices).route_layer(limit(SCOPE_SYMBOL_PRICES)),
        )
        .route(
            "/prices/tokens",
            get(get_token_prices).route_layer(limit(SCOPE_TOKEN_PRICES)),
        )
        .route(
            "/prices/dex",
            get(get_dex_price).route_layer(limit(SCOPE_DEX_PRICE)),
        )
}
