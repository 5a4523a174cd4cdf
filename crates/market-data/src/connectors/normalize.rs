//! Helpers for turning loosely-typed upstream rows into [`NormalizedHolding`]s.

use serde_json::Value;

use super::models::NormalizedHolding;

/// Parse a JSON number or numeric string into a finite `f64`.
pub fn number_from(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// First field in `fields` holding a finite number.
pub fn first_number(row: &Value, fields: &[&str]) -> Option<f64> {
    fields
        .iter()
        .filter_map(|field| row.get(*field))
        .find_map(number_from)
}

/// First field in `fields` holding a non-blank string.
pub fn first_string<'a>(row: &'a Value, fields: &[&str]) -> Option<&'a str> {
    fields
        .iter()
        .filter_map(|field| row.get(*field).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// Locate the list of rows in a holdings payload.
///
/// Accepts a bare array or an object wrapping it under one of `keys`.
pub fn rows_of<'a>(body: &'a Value, keys: &[&str]) -> Option<&'a Vec<Value>> {
    match body {
        Value::Array(rows) => Some(rows),
        Value::Object(map) => keys
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_array)),
        _ => None,
    }
}

/// Field-name candidates for one normalization pass.
pub struct FieldMap {
    pub id: &'static [&'static str],
    pub symbol: &'static [&'static str],
    pub name: &'static [&'static str],
    pub quantity: &'static [&'static str],
    pub unit_price: &'static [&'static str],
    pub market_value: &'static [&'static str],
    pub currency: &'static [&'static str],
}

/// Normalize one upstream row.
///
/// Returns `None` when the row has no symbol or its quantity is not a finite
/// positive number. `symbol_transform` maps the raw instrument code to a
/// display symbol before uppercasing.
pub fn normalize_row(
    row: &Value,
    fields: &FieldMap,
    default_currency: &str,
    asset_class: &str,
    source_type: &str,
    symbol_transform: fn(&str) -> String,
) -> Option<NormalizedHolding> {
    let quantity = first_number(row, fields.quantity).filter(|q| *q > 0.0)?;
    let raw_symbol = first_string(row, fields.symbol)?;
    let symbol = symbol_transform(raw_symbol).to_uppercase();

    let unit_price = first_number(row, fields.unit_price);
    let market_value =
        first_number(row, fields.market_value).or_else(|| unit_price.map(|p| p * quantity));

    let currency = first_string(row, fields.currency)
        .unwrap_or(default_currency)
        .to_uppercase();

    Some(NormalizedHolding {
        external_id: first_string(row, fields.id)
            .unwrap_or(raw_symbol)
            .to_string(),
        name: first_string(row, fields.name)
            .map(str::to_string)
            .unwrap_or_else(|| symbol.clone()),
        symbol,
        quantity,
        unit_price,
        market_value,
        currency,
        asset_class: asset_class.to_string(),
        source_type: source_type.to_string(),
        raw: Some(row.clone()),
    })
}
