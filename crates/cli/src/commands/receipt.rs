//! Receipt extraction commands.
//!
//! # Usage
//!
//! ```bash
//! # Validate a saved model response
//! checkin-cli receipt extract response.txt
//!
//! # Read the response from stdin
//! cat response.txt | checkin-cli receipt extract
//!
//! # Print the prompt to send with the image
//! checkin-cli receipt prompt
//! ```

use std::path::Path;

use tokio::io::AsyncReadExt;
use tracing::info;

use checkin_core::{ExtractionOutcome, RECEIPT_EXTRACTION_PROMPT, extract as extract_receipt};

/// Exit status when the model reported a domain error.
pub const EXIT_DOMAIN_ERROR: u8 = 2;

/// Exit status when the response was not structured data.
pub const EXIT_PARSE_ERROR: u8 = 3;

/// Run extraction on a saved model response and print the outcome as JSON.
///
/// Reads from `path`, or stdin when `path` is `None` or `-`. Returns the
/// process exit status for the outcome.
///
/// # Errors
///
/// Returns an error if the input cannot be read or the outcome cannot be
/// serialized.
#[allow(clippy::print_stdout)]
pub async fn extract(path: Option<&str>) -> Result<u8, Box<dyn std::error::Error>> {
    let raw = match path {
        None | Some("-") => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
        Some(file_path) => {
            let path = Path::new(file_path);
            if !path.exists() {
                return Err(format!("File not found: {file_path}").into());
            }
            tokio::fs::read_to_string(path).await?
        }
    };

    info!(bytes = raw.len(), "Validating model response");

    let outcome = extract_receipt(&raw);
    println!("{}", serde_json::to_string_pretty(&outcome)?);

    Ok(exit_status(&outcome))
}

/// Print the extraction prompt.
#[allow(clippy::print_stdout)]
pub fn prompt() {
    println!("{RECEIPT_EXTRACTION_PROMPT}");
}

const fn exit_status(outcome: &ExtractionOutcome) -> u8 {
    match outcome {
        ExtractionOutcome::Success { .. } => 0,
        ExtractionOutcome::DomainError { .. } => EXIT_DOMAIN_ERROR,
        ExtractionOutcome::ParseError { .. } => EXIT_PARSE_ERROR,
    }
}
