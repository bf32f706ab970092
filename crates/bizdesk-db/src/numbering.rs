//! # Number Allocation
//!
//! Persists the numbering rules from `bizdesk_core::numbering`.
//!
//! ## Allocation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  attempt 1..=1+retries                                                  │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  WriteTx::begin            (write lock held from here)                 │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  next_number(conn)         SELECT numbers LIKE 'INV-202401-%'          │
//! │     │                      → max(seq) + 1 → "INV-202401-0008"          │
//! │     ▼                                                                   │
//! │  INSERT document           UNIQUE(invoice_number) is the backstop      │
//! │     │                                                                   │
//! │     ├── Ok ───────────────► COMMIT                                     │
//! │     └── UNIQUE violation ─► ROLLBACK, warn, next attempt               │
//! │                                                                         │
//! │  Attempts exhausted → DbError::Conflict                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Numbers are never reserved ahead of the insert, so a failed create leaves
//! no gap.

use std::future::Future;

use bizdesk_core::numbering::{next_sequence, NumberingPeriod};
use bizdesk_core::types::DocumentKind;
use sqlx::SqliteConnection;
use tracing::{debug, warn};

use crate::error::{DbError, DbResult};

/// The `table.column` a numbering collision is reported on.
pub fn number_column(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Invoice => "invoices.invoice_number",
        DocumentKind::Proposal => "proposals.number",
    }
}

/// Computes the next free number for `kind` in `period`.
///
/// Must run on the connection of the transaction that will insert the
/// document, otherwise two writers can compute the same number.
pub async fn next_number(
    conn: &mut SqliteConnection,
    kind: DocumentKind,
    period: NumberingPeriod,
) -> DbResult<String> {
    let sql = match kind {
        DocumentKind::Invoice => "SELECT invoice_number FROM invoices WHERE invoice_number LIKE ?1",
        DocumentKind::Proposal => "SELECT number FROM proposals WHERE number LIKE ?1",
    };
    let pattern = format!("{}-%", period.prefix(kind));

    let existing: Vec<String> = sqlx::query_scalar(sql)
        .bind(&pattern)
        .fetch_all(&mut *conn)
        .await?;

    let sequence = next_sequence(kind, period, existing.iter().map(String::as_str));
    let number = period.format(kind, sequence);

    debug!(kind = %kind, number = %number, scanned = existing.len(), "Allocated number");
    Ok(number)
}

/// Runs `attempt` until it stops colliding on the number column.
///
/// `attempt` receives the 1-based attempt counter and must open its own
/// transaction. Only a UNIQUE violation on the number column is retried;
/// every other error is returned as-is.
pub async fn with_number_retry<T, F, Fut>(
    kind: DocumentKind,
    max_retries: u32,
    mut attempt: F,
) -> DbResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = DbResult<T>>,
{
    let column = number_column(kind);
    let attempts = max_retries.saturating_add(1);

    for n in 1..=attempts {
        match attempt(n).await {
            Err(e) if e.is_unique_violation_on(column) => {
                warn!(kind = %kind, attempt = n, of = attempts, "Number collision, retrying");
            }
            other => return other,
        }
    }

    Err(DbError::conflict(format!(
        "could not allocate a unique {kind} number after {attempts} attempts"
    )))
}
