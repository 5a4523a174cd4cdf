//! Candidate `Authorization` header encodings for API-key providers.
//!
//! Some brokers accept the raw key, others a prefixed scheme, and newer key
//! pairs use HTTP Basic. Connectors try the applicable styles in order and
//! stop at the first outcome that is not an auth rejection. Adding a style is
//! one more entry in [`AUTH_STYLES`].

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

/// One way of turning a credential into an `Authorization` header value.
#[derive(Clone, Copy)]
pub struct AuthStyle {
    /// Non-secret label reported in diagnostics.
    pub name: &'static str,
    applies: fn(&str) -> bool,
    encode: fn(&str) -> String,
}

impl AuthStyle {
    /// Header value for `credential`, or `None` if this style does not apply.
    pub fn header_value(&self, credential: &str) -> Option<String> {
        (self.applies)(credential).then(|| (self.encode)(credential))
    }
}

impl std::fmt::Debug for AuthStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

fn always(_: &str) -> bool {
    true
}

fn is_key_pair(credential: &str) -> bool {
    credential
        .split_once(':')
        .map(|(key, secret)| !key.is_empty() && !secret.is_empty())
        .unwrap_or(false)
}

fn is_single_key(credential: &str) -> bool {
    !is_key_pair(credential)
}

fn raw(credential: &str) -> String {
    credential.to_string()
}

fn bearer(credential: &str) -> String {
    format!("Bearer {}", credential)
}

fn basic(credential: &str) -> String {
    format!("Basic {}", BASE64.encode(credential.as_bytes()))
}

/// Ordered list of supported encodings.
pub const AUTH_STYLES: &[AuthStyle] = &[
    AuthStyle {
        name: "basic",
        applies: is_key_pair,
        encode: basic,
    },
    AuthStyle {
        name: "raw",
        applies: is_single_key,
        encode: raw,
    },
    AuthStyle {
        name: "bearer",
        applies: always,
        encode: bearer,
    },
];

/// Applicable `(style, header value)` candidates for `credential`, in try order.
pub fn candidate_headers(credential: &str) -> Vec<(AuthStyle, String)> {
    AUTH_STYLES
        .iter()
        .filter_map(|style| style.header_value(credential).map(|value| (*style, value)))
        .collect()
}
