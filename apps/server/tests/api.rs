use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, Response},
    Router,
};
use folio_market_data::{
    http::{HttpRequest, HttpResponse},
    HttpClient, HttpTransport, MarketDataError,
};
use folio_market_data_server::{api::app_router, build_state_with_http, config::Config};
use serde_json::Value;
use tower::ServiceExt;

/// Transport that is never reachable and counts attempts.
#[derive(Default)]
struct OfflineTransport {
    calls: AtomicUsize,
}

impl OfflineTransport {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpTransport for OfflineTransport {
    async fn execute(
        &self,
        _request: HttpRequest,
        _timeout: Duration,
    ) -> Result<HttpResponse, MarketDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(MarketDataError::Transport("network disabled in tests".to_string()))
    }
}

fn build_test_router(vars: &[(&str, &str)]) -> (Router, Arc<OfflineTransport>) {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let config = Config::from_lookup(move |key| vars.get(key).cloned()).unwrap();

    let transport = Arc::new(OfflineTransport::default());
    let http = HttpClient::new(transport.clone(), Duration::from_secs(1));
    let state = build_state_with_http(&config, http).unwrap();
    (app_router(state, &config), transport)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-forwarded-for", "203.0.113.7")
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, body: &str, client_ip: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", client_ip)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn healthz_works() {
    let (app, _) = build_test_router(&[]);
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn lists_providers_in_registry_order() {
    let (app, _) = build_test_router(&[]);
    let response = app
        .oneshot(get("/api/v1/playground/providers"))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(response.headers().contains_key("x-ratelimit-limit"));
    let body = json_body(response).await;
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        vec!["trading212", "interactive_brokers", "revolut", "trade_republic"]
    );
    assert_eq!(body[0]["support"], "supported");
    assert_eq!(body[0]["displayName"], "Trading 212");
}

#[tokio::test]
async fn unconfigured_connector_makes_no_call() {
    let (app, transport) = build_test_router(&[]);
    let response = app
        .oneshot(post_json("/api/v1/playground/trading212/test", "", "198.51.100.1"))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = json_body(response).await;
    assert_eq!(body["providerId"], "trading212");
    assert_eq!(body["connectionStatus"], "not_configured");
    assert_eq!(body["authStatus"], "not_configured");
    assert_eq!(body["holdings"], Value::Array(vec![]));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn connector_failure_is_a_structured_result() {
    let (app, transport) = build_test_router(&[("TRADING212_API_KEY", "key-123")]);
    let response = app
        .oneshot(post_json("/api/v1/playground/trading212/test", "{}", "198.51.100.2"))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = json_body(response).await;
    assert_eq!(body["connectionStatus"], "error");
    assert_eq!(body["authStatus"], "error");
    assert!(!body.to_string().contains("key-123"));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn unknown_provider_is_not_found() {
    let (app, _) = build_test_router(&[]);
    let response = app
        .oneshot(post_json("/api/v1/playground/robinhood/test", "{}", "198.51.100.3"))
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    let body = json_body(response).await;
    assert_eq!(body["code"], 404);
}

#[tokio::test]
async fn malformed_test_options_are_rejected() {
    let (app, _) = build_test_router(&[]);
    let response = app
        .oneshot(post_json(
            "/api/v1/playground/revolut/test",
            "{\"apiKey\": 42}",
            "198.51.100.4",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn playground_is_rate_limited_per_client() {
    let (app, _) = build_test_router(&[("RATE_LIMIT_PLAYGROUND_PER_MINUTE", "2")]);
    let uri = "/api/v1/playground/revolut/test";

    for remaining in ["1", "0"] {
        let response = app
            .clone()
            .oneshot(post_json(uri, "", "192.0.2.10"))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(response.headers()["x-ratelimit-limit"], "2");
        assert_eq!(response.headers()["x-ratelimit-remaining"], remaining);
    }

    let response = app
        .clone()
        .oneshot(post_json(uri, "", "192.0.2.10"))
        .await
        .unwrap();
    assert_eq!(response.status(), 429);
    assert_eq!(response.headers()["x-ratelimit-remaining"], "0");
    let retry_after: u64 = response.headers()["retry-after"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));
    let body = json_body(response).await;
    assert_eq!(body["code"], 429);

    let other_client = app
        .oneshot(post_json(uri, "", "192.0.2.11"))
        .await
        .unwrap();
    assert_eq!(other_client.status(), 200);
}

#[tokio::test]
async fn too_many_symbols_is_bad_request() {
    let (app, transport) = build_test_router(&[]);
    let symbols: Vec<String> = (0..81).map(|i| format!("S{}", i)).collect();
    let response = app
        .oneshot(get(&format!("/api/v1/prices?symbols={}", symbols.join(","))))
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn unknown_symbol_is_absent_without_upstream_call() {
    let (app, transport) = build_test_router(&[]);
    let response = app
        .oneshot(get("/api/v1/prices?symbols=UNKNOWNCOIN"))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(json_body(response).await, serde_json::json!({}));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn missing_symbols_is_bad_request() {
    let (app, _) = build_test_router(&[]);
    let response = app.oneshot(get("/api/v1/prices")).await.unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn unresolved_mints_are_omitted() {
    let (app, transport) = build_test_router(&[]);
    let response = app
        .oneshot(get("/api/v1/prices/tokens?mints=MintA,MintB"))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(json_body(response).await, serde_json::json!({}));
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn unresolved_dex_price_is_not_found() {
    let (app, _) = build_test_router(&[]);
    let response = app
        .oneshot(get("/api/v1/prices/dex?chain=ethereum&address=0xabc"))
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn oversized_chain_is_bad_request() {
    let (app, transport) = build_test_router(&[]);
    let uri = format!("/api/v1/prices/dex?chain={}&address=0xabc", "c".repeat(41));
    let response = app.oneshot(get(&uri)).await.unwrap();
    assert_eq!(response.status(), 400);
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn base_url_override_without_key_makes_no_call() {
    let (app, transport) = build_test_router(&[("TRADING212_API_KEY", "operator-secret")]);
    let response = app
        .oneshot(post_json(
            "/api/v1/playground/trading212/test",
            "{\"baseUrl\": \"https://attacker.example\"}",
            "198.51.100.5",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = json_body(response).await;
    assert_eq!(body["connectionStatus"], "error");
    assert_eq!(body["authStatus"], "error");
    assert!(!body.to_string().contains("operator-secret"));
    assert_eq!(transport.calls(), 0);
}

#[tokio::test]
async fn repeated_symbols_count_against_limit() {
    let (app, transport) = build_test_router(&[]);
    let symbols = vec!["ETH"; 200].join(",");
    let response = app
        .oneshot(get(&format!("/api/v1/prices?symbols={}", symbols)))
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    assert_eq!(transport.calls(), 0);
}
