use reqwest::header::HeaderMap;

/// Header names consulted, in order, for an IP-derived identifier.
const IP_HEADERS: &[&str] = &["x-forwarded-for", "x-real-ip", "cf-connecting-ip"];

/// Maximum number of user-agent characters kept in a fallback identifier.
const USER_AGENT_PREFIX_CHARS: usize = 64;

/// Best-effort caller fingerprint used as the rate-limit partition key.
///
/// Precedence: first entry of `x-forwarded-for`, then `x-real-ip`, then
/// `cf-connecting-ip`, then a truncated user agent prefixed with `ua:` so it
/// can never collide with an address.
pub fn client_identifier(headers: &HeaderMap) -> String {
    for name in IP_HEADERS {
        let value = headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        if let Some(ip) = value {
            return ip.to_string();
        }
    }

    let agent = headers
        .get(reqwest::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown");

    format!(
        "ua:{}",
        agent.chars().take(USER_AGENT_PREFIX_CHARS).collect::<String>()
    )
}
