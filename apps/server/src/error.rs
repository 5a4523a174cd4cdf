use axum::{
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use folio_market_data::{http::safe_error_message, ErrorKind, MarketDataError, RateLimitResult};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    MarketData(#[from] MarketDataError),
    #[error("Not Found")]
    NotFound,
    #[error("{0}")]
    BadRequest(String),
    #[error("Too many requests, retry in {} seconds", .0.retry_after_seconds)]
    TooManyRequests(RateLimitResult),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, msg) = match &self {
            ApiError::MarketData(e) => {
                let status = StatusCode::from_u16(e.kind().status_code())
                    .unwrap_or(StatusCode::BAD_GATEWAY);
                if e.kind() != ErrorKind::Validation && e.kind() != ErrorKind::NotFound {
                    tracing::warn!("Request failed: {}", safe_error_message(e));
                }
                (status, safe_error_message(e))
            }
            ApiError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason.clone()),
            ApiError::TooManyRequests(_) => (StatusCode::TOO_MANY_REQUESTS, self.to_string()),
        };
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message: msg,
        });
        let mut response = (status, body).into_response();
        if let ApiError::TooManyRequests(result) = &self {
            append_rate_limit_headers(&mut response, result);
        }
        response
    }
}

/// Copy the `X-RateLimit-*` (and, on rejection, `Retry-After`) headers onto `response`.
pub fn append_rate_limit_headers(response: &mut Response, result: &RateLimitResult) {
    let headers = response.headers_mut();
    for (name, value) in result.headers() {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            headers.insert(name, value);
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
