//! # Invoice Service
//!
//! Create, read, edit, transition and delete invoices.
//!
//! ## Lazy Overdue
//! ```text
//! get(id)   → fetch → sent & due_date < now? → UPDATE ... WHERE status='sent'
//! list(..)  → reconcile_overdue(now) first, then the filtered query
//! mutations → fetch + refresh inside the same write transaction
//! ```
//!
//! There is no background job: an invoice turns overdue the first time
//! anyone looks at it after its due date.

use bizdesk_core::document::{
    is_past_due, Invoice, InvoiceFilter, InvoiceTransition, InvoiceUpdate, NewInvoice,
};
use bizdesk_core::lifecycle::InvoiceStatus;
use bizdesk_core::numbering::NumberingPeriod;
use bizdesk_core::types::{DocumentKind, LineItemInput};
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::DbResult;
use crate::numbering::{next_number, with_number_retry};
use crate::pool::DocumentSettings;
use crate::repository::{invoice as repo, items};
use crate::tx::WriteTx;

/// Invoice operations over a shared pool.
#[derive(Debug, Clone)]
pub struct InvoiceService {
    pool: SqlitePool,
    settings: DocumentSettings,
}

impl InvoiceService {
    pub fn new(pool: SqlitePool, settings: DocumentSettings) -> Self {
        InvoiceService { pool, settings }
    }

    /// Creates a draft invoice with the next number of the current month.
    ///
    /// Input is validated before any number is allocated. A collision on the
    /// number is retried up to `numbering_retries` times.
    pub async fn create(&self, input: NewInvoice) -> DbResult<Invoice> {
        input.validate()?;

        let invoice = with_number_retry(
            DocumentKind::Invoice,
            self.settings.numbering_retries,
            |attempt| insert_new(self.pool.clone(), input.clone(), attempt),
        )
        .await?;

        info!(
            invoice_id = %invoice.id,
            number = %invoice.invoice_number,
            total = %invoice.total,
            "Invoice created"
        );
        Ok(invoice)
    }

    /// Fetches one invoice, marking it overdue first if its time has come.
    pub async fn get(&self, id: &str) -> DbResult<Invoice> {
        let mut invoice = {
            let mut conn = self.pool.acquire().await?;
            repo::fetch(&mut conn, id).await?
        };

        let now = Utc::now();
        if !invoice.refresh_overdue(now) {
            return Ok(invoice);
        }

        let mut tx = WriteTx::begin(&self.pool).await?;
        let result = repo::mark_overdue(tx.conn(), id, now).await;
        if tx.finish(result).await? {
            info!(invoice_id = %id, number = %invoice.invoice_number, "Invoice marked overdue");
            Ok(invoice)
        } else {
            // Another writer moved it on; report what is stored.
            let mut conn = self.pool.acquire().await?;
            repo::fetch(&mut conn, id).await
        }
    }

    /// Lists invoices, newest first, after reconciling overdue ones.
    pub async fn list(&self, filter: &InvoiceFilter) -> DbResult<Vec<Invoice>> {
        self.reconcile_overdue(Utc::now()).await?;

        let mut conn = self.pool.acquire().await?;
        repo::list(&mut conn, filter).await
    }

    /// Persists `sent → overdue` for every invoice past due at `now`.
    ///
    /// Returns how many invoices changed.
    pub async fn reconcile_overdue(&self, now: DateTime<Utc>) -> DbResult<usize> {
        let candidates: Vec<String> = {
            let mut conn = self.pool.acquire().await?;
            repo::sent_due_dates(&mut conn)
                .await?
                .into_iter()
                .filter(|(_, due_date)| is_past_due(InvoiceStatus::Sent, *due_date, now))
                .map(|(id, _)| id)
                .collect()
        };

        if candidates.is_empty() {
            return Ok(0);
        }

        let mut tx = WriteTx::begin(&self.pool).await?;
        let result: DbResult<usize> = async {
            let mut flipped = 0;
            for id in &candidates {
                if repo::mark_overdue(tx.conn(), id, now).await? {
                    flipped += 1;
                }
            }
            Ok(flipped)
        }
        .await;
        let flipped = tx.finish(result).await?;

        if flipped > 0 {
            info!(flipped, "Invoices marked overdue");
        }
        Ok(flipped)
    }

    /// Replaces the whole item list and recomputes totals.
    ///
    /// Nothing changes when any item is invalid.
    pub async fn replace_items(&self, id: &str, inputs: &[LineItemInput]) -> DbResult<Invoice> {
        let mut tx = WriteTx::begin(&self.pool).await?;
        let result: DbResult<Invoice> = async {
            let now = Utc::now();
            let mut invoice = load_current(tx.conn(), id, now).await?;
            invoice.replace_items(inputs, now)?;

            items::replace(tx.conn(), DocumentKind::Invoice, id, &invoice.items).await?;
            repo::update(tx.conn(), &invoice).await?;
            Ok(invoice)
        }
        .await;
        let invoice = tx.finish(result).await?;

        info!(
            invoice_id = %id,
            items = invoice.items.len(),
            total = %invoice.total,
            "Invoice items replaced"
        );
        Ok(invoice)
    }

    /// Applies a partial header update.
    pub async fn update_header(&self, id: &str, update: InvoiceUpdate) -> DbResult<Invoice> {
        let mut tx = WriteTx::begin(&self.pool).await?;
        let result: DbResult<Invoice> = async {
            let now = Utc::now();
            let mut invoice = load_current(tx.conn(), id, now).await?;
            invoice.apply_update(update, now)?;

            repo::update(tx.conn(), &invoice).await?;
            Ok(invoice)
        }
        .await;
        let invoice = tx.finish(result).await?;

        info!(invoice_id = %id, total = %invoice.total, "Invoice header updated");
        Ok(invoice)
    }

    /// Moves an invoice along its lifecycle.
    pub async fn transition(&self, id: &str, transition: InvoiceTransition) -> DbResult<Invoice> {
        let mut tx = WriteTx::begin(&self.pool).await?;
        let result: DbResult<(InvoiceStatus, Invoice)> = async {
            let now = Utc::now();
            let mut invoice = load_current(tx.conn(), id, now).await?;
            let from = invoice.transition(transition, now)?;

            repo::update(tx.conn(), &invoice).await?;
            Ok((from, invoice))
        }
        .await;
        let (from, invoice) = tx.finish(result).await?;

        info!(
            invoice_id = %id,
            number = %invoice.invoice_number,
            from = %from,
            to = %invoice.status,
            "Invoice status changed"
        );
        Ok(invoice)
    }

    /// Deletes an invoice and its items.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        repo::delete(&mut conn, id).await?;

        info!(invoice_id = %id, "Invoice deleted");
        Ok(())
    }
}

/// One numbering attempt: allocate, build, insert, commit.
async fn insert_new(pool: SqlitePool, input: NewInvoice, attempt: u32) -> DbResult<Invoice> {
    let mut tx = WriteTx::begin(&pool).await?;
    let result: DbResult<Invoice> = async {
        let now = Utc::now();
        let number = next_number(tx.conn(), DocumentKind::Invoice, NumberingPeriod::of(now)).await?;
        let invoice = Invoice::create(input, number, now)?;

        repo::insert(tx.conn(), &invoice).await?;
        debug!(number = %invoice.invoice_number, attempt, "Invoice row inserted");
        Ok(invoice)
    }
    .await;
    tx.finish(result).await
}

/// Fetches an invoice for modification, applying the overdue check in
/// memory so the following write persists it.
async fn load_current(
    conn: &mut SqliteConnection,
    id: &str,
    now: DateTime<Utc>,
) -> DbResult<Invoice> {
    let mut invoice = repo::fetch(conn, id).await?;
    if invoice.refresh_overdue(now) {
        debug!(invoice_id = %id, "Invoice past due, now overdue");
    }
    Ok(invoice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::{Database, DbConfig};
    use bizdesk_core::error::CoreError;
    use bizdesk_core::types::NewClient;
    use chrono::Duration;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let client = db
            .clients()
            .create(NewClient {
                name: "Acme".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        (db, client.id)
    }

    fn new_invoice(client_id: &str, due_in_days: i64) -> NewInvoice {
        NewInvoice {
            client_id: client_id.to_string(),
            project_id: None,
            title: "Website build".to_string(),
            description: None,
            issue_date: None,
            due_date: Utc::now() + Duration::days(due_in_days),
            discount_pct: dec!(10),
            tax_pct: dec!(20),
            notes: None,
            terms: None,
            items: vec![
                LineItemInput::new("Design", dec!(2), dec!(50)),
                LineItemInput::new("Hosting", dec!(1), dec!(30)),
            ],
        }
    }

    #[tokio::test]
    async fn test_create_assigns_number_and_totals() {
        let (db, client_id) = setup().await;
        let invoice = db.invoices().create(new_invoice(&client_id, 30)).await.unwrap();

        let period = NumberingPeriod::of(invoice.created_at);
        assert_eq!(invoice.invoice_number, period.format(DocumentKind::Invoice, 1));
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert_eq!(invoice.subtotal, dec!(130));
        assert_eq!(invoice.total, dec!(140.4));

        let stored = db.invoices().get(&invoice.id).await.unwrap();
        assert_eq!(stored.items.len(), 2);
        assert_eq!(stored.items[0].name, "Design");
        assert_eq!(stored.total, dec!(140.4));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_before_numbering() {
        let (db, client_id) = setup().await;
        let mut input = new_invoice(&client_id, 30);
        input.items[1].unit_price = dec!(-1);

        let err = db.invoices().create(input).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        let next = db
            .peek_next_number(DocumentKind::Invoice, NumberingPeriod::of(Utc::now()))
            .await
            .unwrap();
        assert!(next.ends_with("-0001"));
    }

    #[tokio::test]
    async fn test_create_for_unknown_client() {
        let (db, _) = setup().await;
        let err = db.invoices().create(new_invoice("ghost", 30)).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_numbers_increase() {
        let (db, client_id) = setup().await;
        let first = db.invoices().create(new_invoice(&client_id, 30)).await.unwrap();
        let second = db.invoices().create(new_invoice(&client_id, 30)).await.unwrap();

        assert!(first.invoice_number.ends_with("-0001"));
        assert!(second.invoice_number.ends_with("-0002"));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let (db, _) = setup().await;
        let err = db.invoices().get("missing").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_pay_sets_paid_date() {
        let (db, client_id) = setup().await;
        let invoice = db.invoices().create(new_invoice(&client_id, 30)).await.unwrap();

        db.invoices()
            .transition(&invoice.id, InvoiceTransition::Send)
            .await
            .unwrap();
        let paid = db
            .invoices()
            .transition(
                &invoice.id,
                InvoiceTransition::MarkPaid {
                    payment_method: "bank transfer".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(paid.status, InvoiceStatus::Paid);
        assert!(paid.paid_date.is_some());

        let stored = db.invoices().get(&invoice.id).await.unwrap();
        assert_eq!(stored.payment_method.as_deref(), Some("bank transfer"));
        assert!(stored.paid_date.is_some());
    }

    #[tokio::test]
    async fn test_paid_cannot_be_resent() {
        let (db, client_id) = setup().await;
        let invoice = db.invoices().create(new_invoice(&client_id, 30)).await.unwrap();
        let service = db.invoices();

        service.transition(&invoice.id, InvoiceTransition::Send).await.unwrap();
        service
            .transition(
                &invoice.id,
                InvoiceTransition::MarkPaid {
                    payment_method: "cash".to_string(),
                },
            )
            .await
            .unwrap();

        let err = service
            .transition(&invoice.id, InvoiceTransition::Send)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidTransition { .. })));
        assert_eq!(service.get(&invoice.id).await.unwrap().status, InvoiceStatus::Paid);
    }

    #[tokio::test]
    async fn test_overdue_is_persisted_on_get() {
        let (db, client_id) = setup().await;
        let invoice = db.invoices().create(new_invoice(&client_id, -1)).await.unwrap();
        db.invoices()
            .transition(&invoice.id, InvoiceTransition::Send)
            .await
            .unwrap();

        let fetched = db.invoices().get(&invoice.id).await.unwrap();
        assert_eq!(fetched.status, InvoiceStatus::Overdue);

        let raw: String = sqlx::query_scalar("SELECT status FROM invoices WHERE id = ?1")
            .bind(&invoice.id)
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(raw, "overdue");
    }

    #[tokio::test]
    async fn test_list_reconciles_and_filters() {
        let (db, client_id) = setup().await;
        let service = db.invoices();
        let late = service.create(new_invoice(&client_id, -2)).await.unwrap();
        let fine = service.create(new_invoice(&client_id, 10)).await.unwrap();
        service.transition(&late.id, InvoiceTransition::Send).await.unwrap();
        service.transition(&fine.id, InvoiceTransition::Send).await.unwrap();

        let overdue = service
            .list(&InvoiceFilter {
                status: Some(InvoiceStatus::Overdue),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, late.id);

        let all = service.list(&InvoiceFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, fine.id);
    }

    #[tokio::test]
    async fn test_reconcile_at_future_time() {
        let (db, client_id) = setup().await;
        let service = db.invoices();
        let invoice = service.create(new_invoice(&client_id, 5)).await.unwrap();
        service.transition(&invoice.id, InvoiceTransition::Send).await.unwrap();

        assert_eq!(service.reconcile_overdue(Utc::now()).await.unwrap(), 0);
        let later = Utc::now() + Duration::days(6);
        assert_eq!(service.reconcile_overdue(later).await.unwrap(), 1);
        assert_eq!(service.reconcile_overdue(later).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_replace_items_recomputes() {
        let (db, client_id) = setup().await;
        let invoice = db.invoices().create(new_invoice(&client_id, 30)).await.unwrap();

        let updated = db
            .invoices()
            .replace_items(&invoice.id, &[LineItemInput::new("Audit", dec!(1), dec!(100))])
            .await
            .unwrap();

        assert_eq!(updated.subtotal, dec!(100));
        assert_eq!(updated.total, dec!(108));

        let stored = db.invoices().get(&invoice.id).await.unwrap();
        assert_eq!(stored.items.len(), 1);
        assert_eq!(stored.items[0].position, 0);
        assert_eq!(stored.total, dec!(108));
    }

    #[tokio::test]
    async fn test_replace_items_is_atomic() {
        let (db, client_id) = setup().await;
        let invoice = db.invoices().create(new_invoice(&client_id, 30)).await.unwrap();

        let err = db
            .invoices()
            .replace_items(
                &invoice.id,
                &[
                    LineItemInput::new("Ok", dec!(1), dec!(10)),
                    LineItemInput::new("Bad", dec!(-1), dec!(10)),
                ],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

        let stored = db.invoices().get(&invoice.id).await.unwrap();
        assert_eq!(stored.items.len(), 2);
        assert_eq!(stored.subtotal, dec!(130));
    }

    #[tokio::test]
    async fn test_update_header_recomputes_and_clears() {
        let (db, client_id) = setup().await;
        let mut input = new_invoice(&client_id, 30);
        input.notes = Some("Thanks".to_string());
        let invoice = db.invoices().create(input).await.unwrap();

        let updated = db
            .invoices()
            .update_header(
                &invoice.id,
                InvoiceUpdate {
                    tax_pct: Some(Decimal::ZERO),
                    notes: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.total, dec!(117));
        assert_eq!(updated.notes, None);
        assert_eq!(updated.title, "Website build");

        let stored = db.invoices().get(&invoice.id).await.unwrap();
        assert_eq!(stored.total, dec!(117));
        assert_eq!(stored.notes, None);
    }

    #[tokio::test]
    async fn test_locked_invoice_rejects_edits() {
        let (db, client_id) = setup().await;
        let service = db.invoices();
        let invoice = service.create(new_invoice(&client_id, 30)).await.unwrap();
        service.transition(&invoice.id, InvoiceTransition::Send).await.unwrap();
        service.transition(&invoice.id, InvoiceTransition::Cancel).await.unwrap();

        let err = service
            .replace_items(&invoice.id, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::DocumentLocked { .. })));
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let (db, client_id) = setup().await;
        let invoice = db.invoices().create(new_invoice(&client_id, 30)).await.unwrap();

        db.invoices().delete(&invoice.id).await.unwrap();
        let err = db.invoices().delete(&invoice.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let orphans: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoice_items WHERE invoice_id = ?1")
            .bind(&invoice.id)
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(orphans, 0);
    }
}
