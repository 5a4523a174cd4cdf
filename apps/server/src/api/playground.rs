use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use folio_market_data::{
    http::sanitize_message, MarketDataError, PlaygroundTestResult, ProviderDescriptor, RunOptions,
};

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
    rate_limit::{enforce_rate_limit, RouteLimit, SCOPE_PROVIDERS, SCOPE_PROVIDER_TEST},
};

async fn list_providers(
    State(state): State<Arc<AppState>>,
) -> Json<Vec<&'static ProviderDescriptor>> {
    Json(state.registry.descriptors())
}

/// Run one connector's diagnostic test. An empty body means default options.
async fn run_provider_test(
    State(state): State<Arc<AppState>>,
    Path(provider_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<PlaygroundTestResult>> {
    if !state.registry.is_valid_provider_id(&provider_id) {
        let id: String = provider_id.chars().take(64).collect();
        return Err(MarketDataError::UnknownProvider(id).into());
    }

    let options: RunOptions = if body.iter().all(u8::is_ascii_whitespace) {
        RunOptions::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            ApiError::BadRequest(format!(
                "Invalid test options: {}",
                sanitize_message(&e.to_string())
            ))
        })?
    };

    let result = state.registry.run_test(&provider_id, &options).await?;
    Ok(Json(result))
}

pub fn router(state: &AppState) -> Router<Arc<AppState>> {
    let limit = |scope| {
        middleware::from_fn_with_state(
            RouteLimit::new(state.limiter.clone(), scope, state.playground_limit),
            enforce_rate_limit,
        )
    };

    Router::new()
        .route(
            "/playground/providers",
            get(list_providers).route_layer(limit(SCOPE_PROVIDERS)),
        )
        .route(
            "/playground/{provider_id}/test",
            post(run_provider_test).route_layer(limit(SCOPE_PROVIDER_TEST)),
        )
}
