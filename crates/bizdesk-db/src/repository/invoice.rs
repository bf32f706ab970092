//! # Invoice Repository
//!
//! Header rows of the `invoices` table. Items go through [`super::items`].
//!
//! Every function takes the connection of an open unit of work; the
//! invoice service decides where transactions begin and end.

use bizdesk_core::document::{Invoice, InvoiceFilter};
use bizdesk_core::lifecycle::InvoiceStatus;
use bizdesk_core::types::{DocumentKind, LineItem};
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{items, parse_decimal};

const COLUMNS: &str = r#"
    id, invoice_number, client_id, project_id, title, description, status,
    discount_pct, tax_pct, subtotal, discount_amount, tax_amount, total,
    issue_date, due_date, paid_date, payment_method, notes, terms,
    created_at, updated_at
"#;

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: String,
    invoice_number: String,
    client_id: String,
    project_id: Option<String>,
    title: String,
    description: Option<String>,
    status: InvoiceStatus,
    discount_pct: String,
    tax_pct: String,
    subtotal: String,
    discount_amount: String,
    tax_amount: String,
    total: String,
    issue_date: DateTime<Utc>,
    due_date: DateTime<Utc>,
    paid_date: Option<DateTime<Utc>>,
    payment_method: Option<String>,
    notes: Option<String>,
    terms: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InvoiceRow {
    fn into_invoice(self, items: Vec<LineItem>) -> DbResult<Invoice> {
        let decimal = |field: &str, value: &str| parse_decimal("Invoice", field, value);

        Ok(Invoice {
            discount_pct: decimal("discount_pct", &self.discount_pct)?,
            tax_pct: decimal("tax_pct", &self.tax_pct)?,
            subtotal: decimal("subtotal", &self.subtotal)?,
            discount_amount: decimal("discount_amount", &self.discount_amount)?,
            tax_amount: decimal("tax_amount", &self.tax_amount)?,
            total: decimal("total", &self.total)?,
            id: self.id,
            invoice_number: self.invoice_number,
            client_id: self.client_id,
            project_id: self.project_id,
            title: self.title,
            description: self.description,
            status: self.status,
            issue_date: self.issue_date,
            due_date: self.due_date,
            paid_date: self.paid_date,
            payment_method: self.payment_method,
            notes: self.notes,
            terms: self.terms,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Inserts the header and all items of a new invoice.
pub async fn insert(conn: &mut SqliteConnection, invoice: &Invoice) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO invoices (
            id, invoice_number, client_id, project_id, title, description, status,
            discount_pct, tax_pct, subtotal, discount_amount, tax_amount, total,
            issue_date, due_date, paid_date, payment_method, notes, terms,
            created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7,
            ?8, ?9, ?10, ?11, ?12, ?13,
            ?14, ?15, ?16, ?17, ?18, ?19,
            ?20, ?21
        )
        "#,
    )
    .bind(&invoice.id)
    .bind(&invoice.invoice_number)
    .bind(&invoice.client_id)
    .bind(&invoice.project_id)
    .bind(&invoice.title)
    .bind(&invoice.description)
    .bind(invoice.status)
    .bind(invoice.discount_pct.to_string())
    .bind(invoice.tax_pct.to_string())
    .bind(invoice.subtotal.to_string())
    .bind(invoice.discount_amount.to_string())
    .bind(invoice.tax_amount.to_string())
    .bind(invoice.total.to_string())
    .bind(invoice.issue_date)
    .bind(invoice.due_date)
    .bind(invoice.paid_date)
    .bind(&invoice.payment_method)
    .bind(&invoice.notes)
    .bind(&invoice.terms)
    .bind(invoice.created_at)
    .bind(invoice.updated_at)
    .execute(&mut *conn)
    .await?;

    items::insert_all(conn, DocumentKind::Invoice, &invoice.items).await
}

/// Loads an invoice with its items, or `NotFound`.
pub async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Invoice> {
    let row: Option<InvoiceRow> =
        sqlx::query_as(&format!("SELECT {COLUMNS} FROM invoices WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

    let row = row.ok_or_else(|| DbError::not_found("Invoice", id))?;
    let items = items::fetch(conn, DocumentKind::Invoice, id).await?;
    row.into_invoice(items)
}

/// Writes back every mutable header column.
pub async fn update(conn: &mut SqliteConnection, invoice: &Invoice) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE invoices SET
            project_id = ?2,
            title = ?3,
            description = ?4,
            status = ?5,
            discount_pct = ?6,
            tax_pct = ?7,
            subtotal = ?8,
            discount_amount = ?9,
            tax_amount = ?10,
            total = ?11,
            due_date = ?12,
            paid_date = ?13,
            payment_method = ?14,
            notes = ?15,
            terms = ?16,
            updated_at = ?17
        WHERE id = ?1
        "#,
    )
    .bind(&invoice.id)
    .bind(&invoice.project_id)
    .bind(&invoice.title)
    .bind(&invoice.description)
    .bind(invoice.status)
    .bind(invoice.discount_pct.to_string())
    .bind(invoice.tax_pct.to_string())
    .bind(invoice.subtotal.to_string())
    .bind(invoice.discount_amount.to_string())
    .bind(invoice.tax_amount.to_string())
    .bind(invoice.total.to_string())
    .bind(invoice.due_date)
    .bind(invoice.paid_date)
    .bind(&invoice.payment_method)
    .bind(&invoice.notes)
    .bind(&invoice.terms)
    .bind(invoice.updated_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Invoice", &invoice.id));
    }
    Ok(())
}

/// Flips one invoice from `sent` to `overdue`.
///
/// Returns `false` when the row was no longer `sent` (another writer got
/// there first or the invoice was paid meanwhile).
pub async fn mark_overdue(
    conn: &mut SqliteConnection,
    id: &str,
    now: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        "UPDATE invoices SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
    )
    .bind(InvoiceStatus::Overdue)
    .bind(now)
    .bind(id)
    .bind(InvoiceStatus::Sent)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// `(id, due_date)` of every invoice still marked `sent`.
pub async fn sent_due_dates(conn: &mut SqliteConnection) -> DbResult<Vec<(String, DateTime<Utc>)>> {
    let rows: Vec<(String, DateTime<Utc>)> =
        sqlx::query_as("SELECT id, due_date FROM invoices WHERE status = ?1")
            .bind(InvoiceStatus::Sent)
            .fetch_all(&mut *conn)
            .await?;
    Ok(rows)
}

/// Lists invoices matching `filter`, newest first, with their items.
pub async fn list(conn: &mut SqliteConnection, filter: &InvoiceFilter) -> DbResult<Vec<Invoice>> {
    let rows: Vec<InvoiceRow> = sqlx::query_as(&format!(
        r#"
        SELECT {COLUMNS} FROM invoices
        WHERE (?1 IS NULL OR status = ?1)
          AND (?2 IS NULL OR client_id = ?2)
          AND (?3 IS NULL OR project_id = ?3)
        ORDER BY created_at DESC, invoice_number DESC
        LIMIT ?4 OFFSET ?5
        "#
    ))
    .bind(filter.status)
    .bind(&filter.client_id)
    .bind(&filter.project_id)
    .bind(filter.limit())
    .bind(filter.offset())
    .fetch_all(&mut *conn)
    .await?;

    debug!(count = rows.len(), "Listed invoices");

    let mut invoices = Vec::with_capacity(rows.len());
    for row in rows {
        let items = items::fetch(conn, DocumentKind::Invoice, &row.id).await?;
        invoices.push(row.into_invoice(items)?);
    }
    Ok(invoices)
}

/// Deletes an invoice; its items go with it.
pub async fn delete(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    let result = sqlx::query("DELETE FROM invoices WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Invoice", id));
    }
    Ok(())
}
