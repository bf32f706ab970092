//! # CLI Commands Module
//!
//! One file per command group; each returns a JSON value for `main` to print.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (shared helpers, next-number)
//! ├── client.rs    ◄─── Clients and projects
//! ├── invoice.rs   ◄─── Invoice CRUD and lifecycle
//! ├── proposal.rs  ◄─── Proposal CRUD and lifecycle
//! └── seed.rs      ◄─── Demo data
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  $ bizdesk invoice items 3f2a… --file items.json                       │
//! │         │                                                               │
//! │         │ (clap derive)                                                 │
//! │         ▼                                                               │
//! │  InvoiceCommand::Items { id, file }                                     │
//! │         │                                                               │
//! │         │ read_json::<Vec<LineItemInput>>(file)   ("-" reads stdin)     │
//! │         ▼                                                               │
//! │  db.invoices().replace_items(&id, &items)                               │
//! │         │                                                               │
//! │         │ to_output (serde_json)                                        │
//! │         ▼                                                               │
//! │  stdout: { "id": "3f2a…", "invoice_number": "INV-202401-0001", … }      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fs;
use std::io::Read;
use std::path::Path;

use bizdesk_core::{DocumentKind, NumberingPeriod};
use bizdesk_db::Database;
use chrono::Utc;
use clap::{Args, ValueEnum};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ApiError;

pub mod client;
pub mod invoice;
pub mod proposal;
pub mod seed;

// =============================================================================
// Shared Helpers
// =============================================================================

/// Reads and parses a JSON input file; `-` reads standard input.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ApiError> {
    let raw = if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| ApiError::invalid_input(format!("Cannot read stdin: {}", e)))?;
        buffer
    } else {
        fs::read_to_string(path).map_err(|e| {
            ApiError::invalid_input(format!("Cannot read {}: {}", path.display(), e))
        })?
    };

    debug!(path = %path.display(), bytes = raw.len(), "Read JSON input");
    parse_json(&raw)
}

/// Parses a JSON document into an input type.
pub fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T, ApiError> {
    Ok(serde_json::from_str(raw)?)
}

/// Serializes a command result for printing.
pub fn to_output<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::internal(format!("Cannot serialize output: {}", e)))
}

/// Standard body for delete commands.
pub(crate) fn deleted(kind: &str, id: &str) -> Value {
    json!({ "deleted": kind, "id": id })
}

// =============================================================================
// next-number
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Invoice,
    Proposal,
}

impl From<KindArg> for DocumentKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Invoice => DocumentKind::Invoice,
            KindArg::Proposal => DocumentKind::Proposal,
        }
    }
}

#[derive(Debug, Args)]
pub struct NextNumberArgs {
    /// Document type
    #[arg(value_enum)]
    pub kind: KindArg,

    /// Period as YYYYMM (defaults to the current month)
    #[arg(long, value_parser = parse_period)]
    pub period: Option<NumberingPeriod>,
}

/// Parses `YYYYMM` into a numbering period.
pub fn parse_period(raw: &str) -> Result<NumberingPeriod, String> {
    let raw = raw.trim();
    if raw.len() != 6 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("expected YYYYMM, got '{}'", raw));
    }

    let year: i32 = raw[..4].parse().map_err(|_| format!("bad year in '{}'", raw))?;
    let month: u32 = raw[4..].parse().map_err(|_| format!("bad month in '{}'", raw))?;
    NumberingPeriod::new(year, month).map_err(|e| e.to_string())
}

/// Previews the next number without reserving it.
pub async fn next_number(db: &Database, args: NextNumberArgs) -> Result<Value, ApiError> {
    let kind = DocumentKind::from(args.kind);
    let period = args.period.unwrap_or_else(|| NumberingPeriod::of(Utc::now()));
    let number = db.peek_next_number(kind, period).await?;

    Ok(json!({
        "kind": kind.as_str(),
        "period": period.to_string(),
        "next_number": number,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizdesk_core::LineItemInput;
    use bizdesk_db::DbConfig;

    #[test]
    fn test_parse_period() {
        let period = parse_period("202403").unwrap();
        assert_eq!(period.year(), 2024);
        assert_eq!(period.month(), 3);

        assert!(parse_period("2024-03").is_err());
        assert!(parse_period("202413").is_err());
        assert!(parse_period("20243").is_err());
    }

    #[test]
    fn test_parse_json_errors_are_invalid_input() {
        let items: Vec<LineItemInput> =
            parse_json(r#"[{ "name": "Design", "quantity": "2", "unit_price": "50" }]"#).unwrap();
        assert_eq!(items.len(), 1);

        let err = parse_json::<Vec<LineItemInput>>("{ not json").unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidInput);
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_read_json_missing_file() {
        let err = read_json::<Value>(Path::new("/definitely/not/here.json")).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_next_number_on_empty_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let output = next_number(
            &db,
            NextNumberArgs {
                kind: KindArg::Invoice,
                period: Some(parse_period("202401").unwrap()),
            },
        )
        .await
        .unwrap();

        assert_eq!(output["next_number"], "INV-202401-0001");
        assert_eq!(output["period"], "202401");
        assert_eq!(output["kind"], "invoice");
    }
}
