//! Scripted transport for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{HttpRequest, HttpResponse, HttpTransport};
use crate::errors::MarketDataError;

enum Scripted {
    Respond(HttpResponse),
    Fail(MarketDataError),
    Hang,
}

/// Replays queued outcomes in order and records every request it sees.
#[derive(Default)]
pub(crate) struct FakeTransport {
    script: Mutex<VecDeque<Scripted>>,
    seen: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_json(&self, status: u16, body: Value) {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        self.push(Scripted::Respond(HttpResponse {
            status,
            headers,
            body: body.to_string().into_bytes(),
        }));
    }

    pub(crate) fn push_text(&self, status: u16, body: &str) {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "text/plain".to_string());
        self.push(Scripted::Respond(HttpResponse {
            status,
            headers,
            body: body.as_bytes().to_vec(),
        }));
    }

    pub(crate) fn push_error(&self, error: MarketDataError) {
        self.push(Scripted::Fail(error));
    }

    pub(crate) fn push_hang(&self) {
        self.push(Scripted::Hang);
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    fn push(&self, outcome: Scripted) {
        self.script.lock().unwrap().push_back(outcome);
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn execute(
        &self,
        request: HttpRequest,
        _timeout: Duration,
    ) -> Result<HttpResponse, MarketDataError> {
        self.seen.lock().unwrap().push(request);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Respond(response)) => Ok(response),
            Some(Scripted::Fail(error)) => Err(error),
            Some(Scripted::Hang) => std::future::pending().await,
            None => Err(MarketDataError::Transport(
                "no scripted response left".to_string(),
            )),
        }
    }
}
