//! Integration tests for receipt extraction.
//!
//! Each case is a complete model response in one of the shapes seen in
//! practice: chatty fenced JSON, bare JSON, error markers, and output that
//! is not usable at all.

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use std::str::FromStr;

use checkin_core::{
    DomainErrorKind, ExtractionOutcome, RECEIPT_EXTRACTION_PROMPT, ReceiptData, extract,
};
use rust_decimal::Decimal;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn success(raw: &str) -> (ReceiptData, f64) {
    match extract(raw) {
        ExtractionOutcome::Success { data, confidence } => (data, confidence),
        other => panic!("expected success, got {other:?}"),
    }
}

const RESTAURANT_RESPONSE: &str = r#"Here is the extracted receipt data:

```json
{
  "storeName": "Blue Door Bistro",
  "storeAddress": "12 Harbor St, Portland, ME",
  "date": "2026-09-14",
  "totalAmount": 58.42,
  "subtotal": 45.50,
  "tax": 3.42,
  "tip": 9.50,
  "paymentMethod": "Visa",
  "lastFourDigits": "4242",
  "currency": "USD",
  "receiptNumber": "A-10293",
  "items": [
    {"name": "Clam Chowder", "quantity": 2, "price": 7.50},
    {"name": "Lobster Roll", "quantity": 1, "price": 30.50}
  ],
  "confidence": 0.92
}
```

Let me know if you need anything else."#;

// =============================================================================
// Successful extractions
// =============================================================================

#[test]
fn test_full_restaurant_receipt() {
    let (data, confidence) = success(RESTAURANT_RESPONSE);

    assert_eq!(data.store_name.as_deref(), Some("Blue Door Bistro"));
    assert_eq!(
        data.store_address.as_deref(),
        Some("12 Harbor St, Portland, ME")
    );
    assert_eq!(data.date.as_deref(), Some("2026-09-14"));
    assert_eq!(data.total_amount, Some(dec("58.42")));
    assert_eq!(data.subtotal, Some(dec("45.50")));
    assert_eq!(data.tax, Some(dec("3.42")));
    assert_eq!(data.tip, Some(dec("9.50")));
    assert_eq!(data.payment_method.as_deref(), Some("Visa"));
    assert_eq!(data.last_four_digits.as_deref(), Some("4242"));
    assert_eq!(data.receipt_number.as_deref(), Some("A-10293"));
    assert_eq!(data.currency, "USD");
    assert!((confidence - 0.92).abs() < f64::EPSILON);

    let items = data.items.unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name, "Clam Chowder");
    assert_eq!(items[0].quantity, Some(dec("2")));
    assert_eq!(items[1].price, Some(dec("30.50")));
}

#[test]
fn test_line_items_sum_to_subtotal() {
    let (data, _) = success(RESTAURANT_RESPONSE);
    let items = data.items.unwrap();

    let sum: Decimal = items
        .iter()
        .map(|item| item.quantity.unwrap() * item.price.unwrap())
        .sum();

    assert_eq!(sum, data.subtotal.unwrap());
    assert_eq!(
        sum + data.tax.unwrap() + data.tip.unwrap(),
        data.total_amount.unwrap()
    );
}

#[test]
fn test_foreign_currency_sparse_receipt() {
    let (data, confidence) = success(
        r#"{"storeName":"Café Lumière","totalAmount":7.2,"currency":"EUR","date":null}"#,
    );

    assert_eq!(data.store_name.as_deref(), Some("Café Lumière"));
    assert_eq!(data.currency, "EUR");
    assert_eq!(data.date, None);
    assert_eq!(data.items, None);
    assert!((confidence - 0.5).abs() < f64::EPSILON);
}

#[test]
fn test_wrongly_typed_fields_are_dropped_not_coerced() {
    let (data, confidence) = success(
        r#"{"storeName":"Acme","totalAmount":"12.99","tax":"n/a","lastFourDigits":4242,"items":{"name":"Widget"},"confidence":"high"}"#,
    );

    assert_eq!(data.store_name.as_deref(), Some("Acme"));
    assert_eq!(data.total_amount, None);
    assert_eq!(data.tax, None);
    assert_eq!(data.last_four_digits, None);
    assert_eq!(data.items, None);
    assert!((confidence - 0.5).abs() < f64::EPSILON);
}

#[test]
fn test_falsy_error_marker_is_ignored() {
    let (data, _) = success(r#"{"error":null,"storeName":"Acme","totalAmount":1}"#);
    assert_eq!(data.total_amount, Some(Decimal::ONE));

    let (data, _) = success(r#"{"error":"","storeName":"Acme"}"#);
    assert_eq!(data.store_name.as_deref(), Some("Acme"));
}

// =============================================================================
// Domain errors
// =============================================================================

#[test]
fn test_error_markers_from_prompt_are_recognized() {
    for kind in [DomainErrorKind::NotAReceipt, DomainErrorKind::Unreadable] {
        assert!(RECEIPT_EXTRACTION_PROMPT.contains(kind.as_str()));

        let raw = format!("```json\n{{\"error\": \"{kind}\", \"confidence\": 0}}\n```");
        assert_eq!(extract(&raw), ExtractionOutcome::domain_error(kind));
    }
}

#[test]
fn test_error_marker_wins_over_data() {
    let outcome = extract(
        r#"{"error":"NOT_A_RECEIPT","storeName":"Acme","totalAmount":5,"confidence":0.9}"#,
    );

    assert_eq!(outcome.data(), None);
    assert_eq!(outcome.confidence(), Some(0.0));
    assert!(!outcome.is_retryable());
}

#[test]
fn test_unknown_error_marker_is_unreadable() {
    let outcome = extract(r#"{"error":"BLURRY_IMAGE"}"#);
    assert_eq!(
        outcome,
        ExtractionOutcome::domain_error(DomainErrorKind::Unreadable)
    );
}

// =============================================================================
// Parse errors
// =============================================================================

#[test]
fn test_unusable_responses_are_retryable() {
    let responses = [
        "I'm sorry, I can't read this image.",
        "```json\n{\"storeName\": \"Acme\",\n```",
        "[{\"storeName\": \"Acme\"}]",
        "",
    ];

    for raw in responses {
        let outcome = extract(raw);
        assert!(
            matches!(outcome, ExtractionOutcome::ParseError { .. }),
            "{raw:?} gave {outcome:?}"
        );
        assert!(outcome.is_retryable());
        assert_eq!(outcome.confidence(), None);
    }
}

// =============================================================================
// Serialized outcomes
// =============================================================================

#[test]
fn test_success_json_shape() {
    let json = serde_json::to_value(extract(RESTAURANT_RESPONSE)).unwrap();

    assert_eq!(json["outcome"], "success");
    assert_eq!(json["confidence"], 0.92);
    assert_eq!(json["data"]["storeName"], "Blue Door Bistro");
    assert_eq!(json["data"]["totalAmount"], 58.42);
    assert_eq!(json["data"]["items"][1]["name"], "Lobster Roll");
}

#[test]
fn test_domain_error_json_shape() {
    let json = serde_json::to_value(extract(r#"{"error":"UNREADABLE"}"#)).unwrap();

    assert_eq!(json["outcome"], "domain_error");
    assert_eq!(json["kind"], "UNREADABLE");
    assert_eq!(json["confidence"], 0.0);
}

#[test]
fn test_parse_error_json_shape() {
    let json = serde_json::to_value(extract("nope")).unwrap();

    assert_eq!(json["outcome"], "parse_error");
    assert!(json["message"].is_string());
}
