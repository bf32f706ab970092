//! # Proposal Repository
//!
//! Header rows of the `proposals` table. Proposals carry no tax columns and
//! their `number` may be NULL until one is assigned.

use bizdesk_core::document::{Proposal, ProposalFilter};
use bizdesk_core::lifecycle::ProposalStatus;
use bizdesk_core::types::{DocumentKind, LineItem};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{items, parse_decimal};

const COLUMNS: &str = r#"
    id, number, client_id, title, description, status,
    discount_pct, subtotal, discount_amount, total,
    issue_date, valid_until, notes, terms, created_at, updated_at
"#;

#[derive(Debug, sqlx::FromRow)]
struct ProposalRow {
    id: String,
    number: Option<String>,
    client_id: String,
    title: String,
    description: Option<String>,
    status: ProposalStatus,
    discount_pct: String,
    subtotal: String,
    discount_amount: String,
    total: String,
    issue_date: DateTime<Utc>,
    valid_until: Option<NaiveDate>,
    notes: Option<String>,
    terms: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProposalRow {
    fn into_proposal(self, items: Vec<LineItem>) -> DbResult<Proposal> {
        let decimal = |field: &str, value: &str| parse_decimal("Proposal", field, value);

        Ok(Proposal {
            discount_pct: decimal("discount_pct", &self.discount_pct)?,
            subtotal: decimal("subtotal", &self.subtotal)?,
            discount_amount: decimal("discount_amount", &self.discount_amount)?,
            total: decimal("total", &self.total)?,
            id: self.id,
            number: self.number,
            client_id: self.client_id,
            title: self.title,
            description: self.description,
            status: self.status,
            issue_date: self.issue_date,
            valid_until: self.valid_until,
            notes: self.notes,
            terms: self.terms,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Inserts the header and all items of a new proposal.
pub async fn insert(conn: &mut SqliteConnection, proposal: &Proposal) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO proposals (
            id, number, client_id, title, description, status,
            discount_pct, subtotal, discount_amount, total,
            issue_date, valid_until, notes, terms, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6,
            ?7, ?8, ?9, ?10,
            ?11, ?12, ?13, ?14, ?15, ?16
        )
        "#,
    )
    .bind(&proposal.id)
    .bind(&proposal.number)
    .bind(&proposal.client_id)
    .bind(&proposal.title)
    .bind(&proposal.description)
    .bind(proposal.status)
    .bind(proposal.discount_pct.to_string())
    .bind(proposal.subtotal.to_string())
    .bind(proposal.discount_amount.to_string())
    .bind(proposal.total.to_string())
    .bind(proposal.issue_date)
    .bind(proposal.valid_until)
    .bind(&proposal.notes)
    .bind(&proposal.terms)
    .bind(proposal.created_at)
    .bind(proposal.updated_at)
    .execute(&mut *conn)
    .await?;

    items::insert_all(conn, DocumentKind::Proposal, &proposal.items).await
}

/// Loads a proposal with its items, or `NotFound`.
pub async fn fetch(conn: &mut SqliteConnection, id: &str) -> DbResult<Proposal> {
    let row: Option<ProposalRow> =
        sqlx::query_as(&format!("SELECT {COLUMNS} FROM proposals WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

    let row = row.ok_or_else(|| DbError::not_found("Proposal", id))?;
    let items = items::fetch(conn, DocumentKind::Proposal, id).await?;
    row.into_proposal(items)
}

/// Writes back every mutable header column.
pub async fn update(conn: &mut SqliteConnection, proposal: &Proposal) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE proposals SET
            number = ?2,
            title = ?3,
            description = ?4,
            status = ?5,
            discount_pct = ?6,
            subtotal = ?7,
            discount_amount = ?8,
            total = ?9,
            valid_until = ?10,
            notes = ?11,
            terms = ?12,
            updated_at = ?13
        WHERE id = ?1
        "#,
    )
    .bind(&proposal.id)
    .bind(&proposal.number)
    .bind(&proposal.title)
    .bind(&proposal.description)
    .bind(proposal.status)
    .bind(proposal.discount_pct.to_string())
    .bind(proposal.subtotal.to_string())
    .bind(proposal.discount_amount.to_string())
    .bind(proposal.total.to_string())
    .bind(proposal.valid_until)
    .bind(&proposal.notes)
    .bind(&proposal.terms)
    .bind(proposal.updated_at)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Proposal", &proposal.id));
    }
    Ok(())
}

/// Lists proposals matching `filter`, newest first, with their items.
pub async fn list(
    conn: &mut SqliteConnection,
    filter: &ProposalFilter,
) -> DbResult<Vec<Proposal>> {
    let rows: Vec<ProposalRow> = sqlx::query_as(&format!(
        r#"
        SELECT {COLUMNS} FROM proposals
        WHERE (?1 IS NULL OR status = ?1)
          AND (?2 IS NULL OR client_id = ?2)
        ORDER BY created_at DESC, id DESC
        LIMIT ?3 OFFSET ?4
        "#
    ))
    .bind(filter.status)
    .bind(&filter.client_id)
    .bind(filter.limit())
    .bind(filter.offset())
    .fetch_all(&mut *conn)
    .await?;

    debug!(count = rows.len(), "Listed proposals");

    let mut proposals = Vec::with_capacity(rows.len());
    for row in rows {
        let items = items::fetch(conn, DocumentKind::Proposal, &row.id).await?;
        proposals.push(row.into_proposal(items)?);
    }
    Ok(proposals)
}

/// Deletes a proposal; its items go with it.
pub async fn delete(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    let result = sqlx::query("DELETE FROM proposals WHERE id = ?1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Proposal", id));
    }
    Ok(())
}
