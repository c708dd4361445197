//! Receipt records produced by extraction.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Currency assumed when the model does not report one.
pub const DEFAULT_CURRENCY: &str = "USD";

/// Confidence assigned when extraction succeeded but the model did not
/// report a usable confidence.
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// A line item on a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptItem {
    /// Item description as printed. Empty when the model gave none.
    pub name: String,
    /// Quantity purchased.
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub quantity: Option<Decimal>,
    /// Line price.
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<Decimal>,
}

/// Structured data extracted from a receipt image.
///
/// Every field except `currency` is optional. `None` means the value could
/// not be determined from the image, which is not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptData {
    /// Merchant name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
    /// Merchant address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_address: Option<String>,
    /// Transaction date, as reported (expected `YYYY-MM-DD`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Grand total.
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub total_amount: Option<Decimal>,
    /// Total before tax and tip.
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub subtotal: Option<Decimal>,
    /// Tax amount.
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub tax: Option<Decimal>,
    /// Tip amount.
    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub tip: Option<Decimal>,
    /// Payment method (e.g. "Visa", "Cash").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    /// Last four digits of the card used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_four_digits: Option<String>,
    /// Currency code.
    pub currency: String,
    /// Receipt or transaction number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_number: Option<String>,
    /// Line items in printed order. `None` when the model did not return a
    /// list, as opposed to an empty list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<ReceiptItem>>,
}

impl Default for ReceiptData {
    fn default() -> Self {
        Self {
            store_name: None,
            store_address: None,
            date: None,
            total_amount: None,
            subtotal: None,
            tax: None,
            tip: None,
            payment_method: None,
            last_four_digits: None,
            currency: DEFAULT_CURRENCY.to_owned(),
            receipt_number: None,
            items: None,
        }
    }
}

/// Why the model refused to extract a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainErrorKind {
    /// The image does not show a receipt.
    NotAReceipt,
    /// The image shows a receipt that cannot be read.
    Unreadable,
}

impl DomainErrorKind {
    /// The wire value the model uses for this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotAReceipt => "NOT_A_RECEIPT",
            Self::Unreadable => "UNREADABLE",
        }
    }
}

impl std::fmt::Display for DomainErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DomainErrorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NOT_A_RECEIPT" => Ok(Self::NotAReceipt),
            "UNREADABLE" => Ok(Self::Unreadable),
            _ => Err(format!("unknown domain error: {s}")),
        }
    }
}

/// Result of validating one model response.
///
/// Domain errors call for a new photo; parse errors call for asking the
/// model again.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExtractionOutcome {
    /// The response described a receipt.
    Success {
        /// Extracted fields.
        data: ReceiptData,
        /// Confidence in `[0, 1]`.
        confidence: f64,
    },
    /// The model reported that the image is not a usable receipt.
    DomainError {
        /// Reported reason.
        kind: DomainErrorKind,
        /// Always `0.0`.
        confidence: f64,
    },
    /// The response could not be read as a JSON object.
    ParseError {
        /// Diagnostic for logs. Never shown to end users.
        message: String,
    },
}

impl ExtractionOutcome {
    /// Build a domain error outcome with zero confidence.
    #[must_use]
    pub const fn domain_error(kind: DomainErrorKind) -> Self {
        Self::DomainError {
            kind,
            confidence: 0.0,
        }
    }

    /// Returns the confidence carried by this outcome, if any.
    #[must_use]
    pub const fn confidence(&self) -> Option<f64> {
        match self {
            Self::Success { confidence, .. } | Self::DomainError { confidence, .. } => {
                Some(*confidence)
            }
            Self::ParseError { .. } => None,
        }
    }

    /// Returns the extracted data on success.
    #[must_use]
    pub const fn data(&self) -> Option<&ReceiptData> {
        match self {
            Self::Success { data, .. } => Some(data),
            _ => None,
        }
    }

    /// Whether asking the model again may help.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ParseError { .. })
    }
}
