//! # Line Item Storage
//!
//! Invoices and proposals keep their items in twin tables with the same
//! shape; only the parent column differs.
//!
//! ```text
//! invoice_items  (invoice_id  → invoices.id  ON DELETE CASCADE)
//! proposal_items (proposal_id → proposals.id ON DELETE CASCADE)
//! ```
//!
//! Items are read back ordered by `position`, which is the submission order.

use bizdesk_core::types::{DocumentKind, LineItem};
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use crate::repository::parse_decimal;

fn table(kind: DocumentKind) -> (&'static str, &'static str) {
    match kind {
        DocumentKind::Invoice => ("invoice_items", "invoice_id"),
        DocumentKind::Proposal => ("proposal_items", "proposal_id"),
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id: String,
    document_id: String,
    position: i64,
    name: String,
    description: Option<String>,
    quantity: String,
    unit: String,
    unit_price: String,
    line_total: String,
    created_at: DateTime<Utc>,
}

impl ItemRow {
    fn into_item(self) -> DbResult<LineItem> {
        Ok(LineItem {
            quantity: parse_decimal("LineItem", "quantity", &self.quantity)?,
            unit_price: parse_decimal("LineItem", "unit_price", &self.unit_price)?,
            line_total: parse_decimal("LineItem", "line_total", &self.line_total)?,
            id: self.id,
            document_id: self.document_id,
            position: self.position,
            name: self.name,
            description: self.description,
            unit: self.unit,
            created_at: self.created_at,
        })
    }
}

/// Inserts `items` for their parent document.
pub async fn insert_all(
    conn: &mut SqliteConnection,
    kind: DocumentKind,
    items: &[LineItem],
) -> DbResult<()> {
    let (table, parent) = table(kind);
    let sql = format!(
        "INSERT INTO {table} \
         (id, {parent}, position, name, description, quantity, unit, unit_price, line_total, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
    );

    for item in items {
        sqlx::query(&sql)
            .bind(&item.id)
            .bind(&item.document_id)
            .bind(item.position)
            .bind(&item.name)
            .bind(&item.description)
            .bind(item.quantity.to_string())
            .bind(&item.unit)
            .bind(item.unit_price.to_string())
            .bind(item.line_total.to_string())
            .bind(item.created_at)
            .execute(&mut *conn)
            .await?;
    }

    debug!(kind = %kind, count = items.len(), "Inserted line items");
    Ok(())
}

/// Loads a document's items in position order.
pub async fn fetch(
    conn: &mut SqliteConnection,
    kind: DocumentKind,
    document_id: &str,
) -> DbResult<Vec<LineItem>> {
    let (table, parent) = table(kind);
    let sql = format!(
        "SELECT id, {parent} AS document_id, position, name, description, \
         quantity, unit, unit_price, line_total, created_at \
         FROM {table} WHERE {parent} = ?1 ORDER BY position"
    );

    let rows: Vec<ItemRow> = sqlx::query_as(&sql)
        .bind(document_id)
        .fetch_all(&mut *conn)
        .await?;

    rows.into_iter().map(ItemRow::into_item).collect()
}

/// Swaps the whole item list of a document.
///
/// Only safe inside a write transaction: the delete and inserts must land
/// together.
pub async fn replace(
    conn: &mut SqliteConnection,
    kind: DocumentKind,
    document_id: &str,
    items: &[LineItem],
) -> DbResult<()> {
    let (table, parent) = table(kind);
    let removed = sqlx::query(&format!("DELETE FROM {table} WHERE {parent} = ?1"))
        .bind(document_id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    debug!(kind = %kind, document_id = %document_id, removed, "Cleared line items");
    insert_all(conn, kind, items).await
}
