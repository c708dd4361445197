//! Instructions sent to the vision model alongside a receipt image.

/// Prompt describing the JSON the extractor expects back.
///
/// Field names and error values here must stay in sync with
/// [`super::extract`].
pub const RECEIPT_EXTRACTION_PROMPT: &str = r#"Analyze this receipt image and extract the following information.
Respond with a single JSON object and nothing else:

{
  "storeName": "name of the store or restaurant",
  "storeAddress": "full address if visible",
  "date": "YYYY-MM-DD",
  "totalAmount": 0.00,
  "subtotal": 0.00,
  "tax": 0.00,
  "tip": 0.00,
  "paymentMethod": "cash, credit card, debit card, etc.",
  "lastFourDigits": "last 4 digits of the card if visible",
  "currency": "ISO 4217 code, e.g. USD",
  "receiptNumber": "receipt or transaction number if visible",
  "items": [
    { "name": "item name", "quantity": 1, "price": 0.00 }
  ],
  "confidence": 0.0
}

Rules:
- Monetary amounts and quantities must be JSON numbers without currency symbols.
- Omit any field you cannot read. Do not guess.
- "confidence" is your certainty from 0 to 1 that the extracted values are correct.
- If the image is not a receipt, respond with {"error": "NOT_A_RECEIPT", "confidence": 0}.
- If the receipt cannot be read, respond with {"error": "UNREADABLE", "confidence": 0}."#;
