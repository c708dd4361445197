//! Receipt extraction from vision model responses.
//!
//! The model is asked (see [`RECEIPT_EXTRACTION_PROMPT`]) for a JSON object
//! describing the receipt. What comes back is untrusted: it may be wrapped
//! in a Markdown fence, carry an `error` marker instead of data, use the
//! wrong JSON types, or not be JSON at all. [`extract`] turns that text into
//! an [`ExtractionOutcome`] without guessing at anything the model did not
//! state.
//!
//! Coercion rules:
//! - numeric fields are kept only when the JSON value is a number
//!   (`"12.99"` is dropped, not parsed)
//! - text fields are kept only when the JSON value is a non-blank string
//! - `items` is kept only when it is an array
//! - `currency` falls back to `USD`
//! - `confidence` falls back to `0.5` and is clamped into `[0, 1]`

mod fence;
mod prompt;

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::types::{
    DEFAULT_CONFIDENCE, DEFAULT_CURRENCY, DomainErrorKind, ExtractionOutcome, ReceiptData,
    ReceiptItem,
};

pub use prompt::RECEIPT_EXTRACTION_PROMPT;

/// Validate one raw model response.
#[instrument(skip(raw), fields(raw_len = raw.len()))]
pub fn extract(raw: &str) -> ExtractionOutcome {
    let body = fence::unwrap_fenced(raw);

    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "Receipt response is not valid JSON");
            return ExtractionOutcome::ParseError {
                message: e.to_string(),
            };
        }
    };

    let Value::Object(fields) = value else {
        debug!("Receipt response is not a JSON object");
        return ExtractionOutcome::ParseError {
            message: "expected a JSON object".to_string(),
        };
    };

    if let Some(kind) = domain_error(&fields) {
        debug!(kind = %kind, "Model rejected receipt image");
        return ExtractionOutcome::domain_error(kind);
    }

    let data = ReceiptData {
        store_name: text_field(&fields, "storeName"),
        store_address: text_field(&fields, "storeAddress"),
        date: text_field(&fields, "date"),
        total_amount: number_field(&fields, "totalAmount"),
        subtotal: number_field(&fields, "subtotal"),
        tax: number_field(&fields, "tax"),
        tip: number_field(&fields, "tip"),
        payment_method: text_field(&fields, "paymentMethod"),
        last_four_digits: text_field(&fields, "lastFourDigits"),
        currency: text_field(&fields, "currency").unwrap_or_else(|| DEFAULT_CURRENCY.to_owned()),
        receipt_number: text_field(&fields, "receiptNumber"),
        items: fields
            .get("items")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(item_from_value).collect()),
    };

    let confidence = fields
        .get("confidence")
        .and_then(Value::as_f64)
        .map_or(DEFAULT_CONFIDENCE, |c| c.clamp(0.0, 1.0));

    debug!(
        confidence,
        items = data.items.as_ref().map_or(0, Vec::len),
        "Extracted receipt"
    );

    ExtractionOutcome::Success { data, confidence }
}

/// The domain error carried by a truthy `error` field, if any.
fn domain_error(fields: &Map<String, Value>) -> Option<DomainErrorKind> {
    let marker = fields.get("error").filter(|v| is_truthy(v))?;

    let kind = marker
        .as_str()
        .and_then(|s| DomainErrorKind::from_str(&s.trim().to_ascii_uppercase()).ok());

    Some(kind.unwrap_or_else(|| {
        warn!(error = %marker, "Unrecognized receipt error marker, treating as unreadable");
        DomainErrorKind::Unreadable
    }))
}

/// JavaScript-style truthiness, which is what the model's `error` marker is
/// checked against.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        _ => None,
    }
}

fn number_field(fields: &Map<String, Value>, key: &str) -> Option<Decimal> {
    fields.get(key).and_then(as_decimal)
}

/// Convert a JSON number to a decimal. Anything else is absent.
fn as_decimal(value: &Value) -> Option<Decimal> {
    let Value::Number(n) = value else {
        return None;
    };

    let repr = n.to_string();
    Decimal::from_str(&repr)
        .or_else(|_| Decimal::from_scientific(&repr))
        .ok()
}

fn item_from_value(value: &Value) -> ReceiptItem {
    let name = match value.get("name") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    };

    ReceiptItem {
        name,
        quantity: value.get("quantity").and_then(as_decimal),
        price: value.get("price").and_then(as_decimal),
    }
}
