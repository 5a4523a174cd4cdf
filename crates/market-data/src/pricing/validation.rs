//! Input limits applied before any upstream call.

use crate::errors::MarketDataError;

/// Maximum symbols per price request.
pub const MAX_SYMBOLS: usize = 80;

/// Maximum addresses (mints) per price request.
pub const MAX_ADDRESSES: usize = 80;

pub const MAX_SYMBOL_LEN: usize = 32;
pub const MAX_CHAIN_LEN: usize = 40;
pub const MAX_ADDRESS_LEN: usize = 128;

/// Split a comma-separated query value into trimmed, non-empty items.
///
/// Duplicates are kept so the item count limits see the raw request.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Non-blank items of `items`, rejected when there are more than `max`.
fn bounded<'a>(
    items: &'a [String],
    max: usize,
    field: &str,
) -> Result<Vec<&'a str>, MarketDataError> {
    let items: Vec<&str> = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if items.len() > max {
        return Err(MarketDataError::Validation(format!(
            "{}: at most {} allowed",
            field, max
        )));
    }
    Ok(items)
}

/// Check a symbol list and return it uppercased and de-duplicated.
///
/// The count limit applies to the items as sent, before de-duplication.
pub fn validate_symbols(symbols: &[String]) -> Result<Vec<String>, MarketDataError> {
    let symbols = bounded(symbols, MAX_SYMBOLS, "symbols")?;
    let mut normalized: Vec<String> = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        if symbol.chars().count() > MAX_SYMBOL_LEN
            || !symbol.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        {
            return Err(MarketDataError::Validation(format!(
                "symbols: invalid symbol (at most {} letters, digits, '-' or '.')",
                MAX_SYMBOL_LEN
            )));
        }
        let symbol = symbol.to_uppercase();
        if !normalized.contains(&symbol) {
            normalized.push(symbol);
        }
    }

    if normalized.is_empty() {
        return Err(MarketDataError::Validation(
            "symbols: at least one symbol is required".to_string(),
        ));
    }
    Ok(normalized)
}

/// Check an address list and return it trimmed and de-duplicated.
pub fn validate_addresses(addresses: &[String]) -> Result<Vec<String>, MarketDataError> {
    let addresses = bounded(addresses, MAX_ADDRESSES, "addresses")?;
    let mut normalized: Vec<String> = Vec::with_capacity(addresses.len());
    for address in addresses {
        validate_address(address)?;
        if !normalized.iter().any(|existing| existing == address) {
            normalized.push(address.to_string());
        }
    }

    if normalized.is_empty() {
        return Err(MarketDataError::Validation(
            "addresses: at least one address is required".to_string(),
        ));
    }
    Ok(normalized)
}

/// Check a chain id. Returns it lowercased.
pub fn validate_chain(chain: &str) -> Result<String, MarketDataError> {
    let chain = chain.trim();
    if chain.is_empty() || chain.chars().count() > MAX_CHAIN_LEN {
        return Err(MarketDataError::Validation(format!(
            "chain: required, at most {} characters",
            MAX_CHAIN_LEN
        )));
    }
    if !chain
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(MarketDataError::Validation(
            "chain: only letters, digits, '-' and '_' are allowed".to_string(),
        ));
    }
    Ok(chain.to_ascii_lowercase())
}

/// Check a single contract or mint address.
pub fn validate_address(address: &str) -> Result<(), MarketDataError> {
    if address.is_empty() || address.chars().count() > MAX_ADDRESS_LEN {
        return Err(MarketDataError::Validation(format!(
            "address: required, at most {} characters",
            MAX_ADDRESS_LEN
        )));
    }
    if !address.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(MarketDataError::Validation(
            "address: only letters and digits are allowed".to_string(),
        ));
    }
    Ok(())
}
