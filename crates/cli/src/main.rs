//! Check-in CLI - token and receipt tooling.
//!
//! # Usage
//!
//! ```bash
//! # Issue a check-in token for a visit
//! checkin-cli token issue --visit abc123
//!
//! # Hash a plaintext token
//! checkin-cli token hash <plaintext>
//!
//! # Inspect a stored expiry
//! checkin-cli token status --expires-at 2026-11-01T00:00:00Z
//!
//! # Check a token against a stored record
//! checkin-cli token check --hash <hex> --expires-at <expiry> <plaintext>
//!
//! # Validate a saved vision-model response
//! checkin-cli receipt extract response.txt
//! ```
//!
//! # Commands
//!
//! - `token issue` - Issue a token and print its redemption link
//! - `token hash` - Print the stored form of a token
//! - `token status` - Expiry status of a stored token
//! - `token check` - Non-consuming check of a presented token
//! - `receipt extract` - Validate a model response
//! - `receipt prompt` - Print the extraction prompt
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Log filter (default: `checkin_cli=info,checkin_core=info`)
//! - `CHECKIN_LOG_FORMAT` - Set to `json` for JSON log lines

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "checkin-cli")]
#[command(author, version, about = "Check-in token and receipt tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue and inspect check-in tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },
    /// Validate receipt extraction responses
    Receipt {
        #[command(subcommand)]
        action: ReceiptAction,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Issue a token for a visit
    Issue {
        /// Visit id the token redeems
        #[arg(short, long)]
        visit: String,

        /// Token lifetime in days (overrides `CHECKIN_TOKEN_TTL_DAYS`)
        #[arg(long)]
        ttl_days: Option<i64>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print the SHA-256 hash of a plaintext token
    Hash {
        /// Plaintext token
        plaintext: String,
    },
    /// Show whether a stored expiry has passed
    Status {
        /// Expiry (RFC 3339, RFC 2822, YYYY-MM-DD, or Unix milliseconds)
        #[arg(short, long)]
        expires_at: String,
    },
    /// Check a presented token against a stored hash and expiry
    Check {
        /// Stored token hash (hex)
        #[arg(long)]
        hash: String,

        /// Stored expiry
        #[arg(short, long)]
        expires_at: String,

        /// Presented plaintext token
        plaintext: String,
    },
}

#[derive(Subcommand)]
enum ReceiptAction {
    /// Validate a model response read from a file or stdin
    Extract {
        /// Path to the response (stdin when omitted or `-`)
        path: Option<String>,
    },
    /// Print the prompt sent with receipt images
    Prompt,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("Command failed: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr so stdout stays parseable. `CHECKIN_LOG_FORMAT=json`
/// switches to JSON lines.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "checkin_cli=info,checkin_core=info".into());

    let json = std::env::var("CHECKIN_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)))
        .init();
}

async fn run(cli: Cli) -> Result<u8, Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Token { action } => match action {
            TokenAction::Issue {
                visit,
                ttl_days,
                json,
            } => commands::token::issue(&visit, ttl_days, json)?,
            TokenAction::Hash { plaintext } => commands::token::hash(&plaintext),
            TokenAction::Status { expires_at } => commands::token::status(&expires_at)?,
            TokenAction::Check {
                hash,
                expires_at,
                plaintext,
            } => {
                if !commands::token::check(&hash, &expires_at, &plaintext)? {
                    return Ok(1);
                }
            }
        },
        Commands::Receipt { action } => match action {
            ReceiptAction::Extract { path } => {
                return commands::receipt::extract(path.as_deref()).await;
            }
            ReceiptAction::Prompt => commands::receipt::prompt(),
        },
    }
    Ok(0)
}
