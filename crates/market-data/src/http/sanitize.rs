//! Secret redaction for anything that may leave the process.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::errors::{MarketDataError, GENERIC_ERROR_MESSAGE, TIMEOUT_MESSAGE};

/// Marker substituted for every redacted secret.
pub const REDACTED: &str = "[REDACTED]";

/// Maximum length (in characters) of an extracted upstream error message.
const MAX_ERROR_MESSAGE_CHARS: usize = 300;

/// Fields inspected, in order, by [`extract_error_message`].
const ERROR_FIELDS: &[&str] = &["error", "message", "details"];

lazy_static! {
    /// `Bearer <token>` in headers or prose.
    static ref BEARER_REGEX: Regex =
        Regex::new(r"(?i)\b(bearer)\s+[A-Za-z0-9\-._~+/]+=*").expect("Invalid regex pattern");

    /// `"access_token": "..."` style fragments (also refresh/id tokens).
    static ref JSON_TOKEN_REGEX: Regex = Regex::new(
        r#"(?i)("(?:access_token|refresh_token|id_token|accessToken|refreshToken|idToken)"\s*:\s*)"[^"]*""#
    )
    .expect("Invalid regex pattern");

    /// `api_key=...`, `apiKey: ...`, `token=...`, `secret=...` assignments.
    static ref KEY_ASSIGNMENT_REGEX: Regex = Regex::new(
        r#"(?i)\b(api[_-]?key|apikey|x-api-key|token|secret|password)(["']?\s*[:=]\s*["']?)[^\s"'&,;}]+"#
    )
    .expect("Invalid regex pattern");

    /// Long opaque credential-looking runs (32+ key characters).
    static ref OPAQUE_KEY_REGEX: Regex =
        Regex::new(r"\b[A-Za-z0-9_\-]{32,}\b").expect("Invalid regex pattern");
}

/// Redact bearer tokens, embedded access/refresh/id tokens and API-key shaped
/// substrings, replacing each with [`REDACTED`].
///
/// # Examples
///
/// ```
/// use folio_market_data::http::sanitize_message;
///
/// let clean = sanitize_message("Authorization: Bearer abc.def-123 failed");
/// assert!(!clean.contains("abc.def-123"));
/// ```
pub fn sanitize_message(text: &str) -> String {
    let text = BEARER_REGEX.replace_all(text, format!("$1 {}", REDACTED).as_str());
    let text = JSON_TOKEN_REGEX.replace_all(&text, format!("${{1}}\"{}\"", REDACTED).as_str());
    let text = KEY_ASSIGNMENT_REGEX.replace_all(&text, format!("${{1}}${{2}}{}", REDACTED).as_str());
    let text = OPAQUE_KEY_REGEX.replace_all(&text, REDACTED);
    text.into_owned()
}

/// Pull a human-readable error out of a decoded response body.
///
/// A string body is used as-is; an object is searched for the first string
/// `error`, `message` or `details` field. The result is sanitized and
/// truncated to 300 characters. Returns `None` when nothing usable is found.
pub fn extract_error_message(body: &Value) -> Option<String> {
    let candidate = match body {
        Value::String(text) => Some(text.as_str()),
        Value::Object(map) => ERROR_FIELDS
            .iter()
            .filter_map(|field| map.get(*field).and_then(Value::as_str))
            .find(|text| !text.trim().is_empty()),
        _ => None,
    }?;

    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return None;
    }

    Some(
        sanitize_message(trimmed)
            .chars()
            .take(MAX_ERROR_MESSAGE_CHARS)
            .collect(),
    )
}

/// Map any failure to exactly one safe, human-readable string.
///
/// Timeouts always yield [`TIMEOUT_MESSAGE`]; other errors yield their
/// sanitized display text, or [`GENERIC_ERROR_MESSAGE`] when that is empty.
pub fn safe_error_message(error: &MarketDataError) -> String {
    if matches!(error, MarketDataError::Timeout) {
        return TIMEOUT_MESSAGE.to_string();
    }

    let message = sanitize_message(error.to_string().trim());
    if message.is_empty() {
        GENERIC_ERROR_MESSAGE.to_string()
    } else {
        message
    }
}
