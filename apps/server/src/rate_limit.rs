//! Per-route rate limiting middleware.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use folio_market_data::{RateLimitOptions, RateLimiter};

use crate::error::{append_rate_limit_headers, ApiError};

pub const SCOPE_SYMBOL_PRICES: &str = "prices:symbols";
pub const SCOPE_TOKEN_PRICES: &str = "prices:tokens";
pub const SCOPE_DEX_PRICE: &str = "prices:dex";
pub const SCOPE_PROVIDERS: &str = "playground:providers";
pub const SCOPE_PROVIDER_TEST: &str = "playground:test";

/// Limiter, scope and policy guarding one route.
#[derive(Clone)]
pub struct RouteLimit {
    limiter: Arc<RateLimiter>,
    scope: &'static str,
    options: RateLimitOptions,
}

impl RouteLimit {
    pub fn new(limiter: Arc<RateLimiter>, scope: &'static str, options: RateLimitOptions) -> Self {
        Self {
            limiter,
            scope,
            options,
        }
    }
}

/// Count the request against its client's budget; reject with 429 once spent.
///
/// Allowed responses carry the same `X-RateLimit-*` headers as rejections.
pub async fn enforce_rate_limit(
    State(limit): State<RouteLimit>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let result = limit
        .limiter
        .check_headers(limit.scope, request.headers(), &limit.options);

    if !result.allowed {
        tracing::debug!(
            scope = limit.scope,
            retry_after = result.retry_after_seconds,
            "Request rejected by rate limiter"
        );
        return Err(ApiError::TooManyRequests(result));
    }

    let mut response = next.run(request).await;
    append_rate_limit_headers(&mut response, &result);
    Ok(response)
}
