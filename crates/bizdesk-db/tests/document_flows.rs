//! End-to-end document scenarios through the public `Database` handle.

use bizdesk_core::document::{
    InvoiceFilter, InvoiceTransition, InvoiceUpdate, NewInvoice, NewProposal, ProposalFilter,
};
use bizdesk_core::error::CoreError;
use bizdesk_core::lifecycle::InvoiceStatus;
use bizdesk_core::types::{LineItemInput, NewClient, NewProject};
use bizdesk_core::Money;
use bizdesk_db::{Database, DbConfig, DbError};
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;

async fn database() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn client(db: &Database, name: &str) -> String {
    db.clients()
        .create(NewClient {
            name: name.to_string(),
            ..Default::default()
        })
        .await
        .unwrap()
        .id
}

fn invoice(client_id: &str, due_in_days: i64) -> NewInvoice {
    NewInvoice {
        client_id: client_id.to_string(),
        project_id: None,
        title: "Website relaunch".to_string(),
        description: Some("Phase 1".to_string()),
        issue_date: None,
        due_date: Utc::now() + Duration::days(due_in_days),
        discount_pct: dec!(10),
        tax_pct: dec!(20),
        notes: None,
        terms: Some("Net 30".to_string()),
        items: vec![
            LineItemInput::new("Design", dec!(2), dec!(50)).with_unit("h"),
            LineItemInput::new("Hosting", dec!(1), dec!(30)),
        ],
    }
}

#[tokio::test]
async fn invoice_totals_end_to_end() {
    let db = database().await;
    let client_id = client(&db, "Acme").await;

    let created = db.invoices().create(invoice(&client_id, 30)).await.unwrap();
    let stored = db.invoices().get(&created.id).await.unwrap();

    assert_eq!(stored.subtotal, dec!(130));
    assert_eq!(stored.discount_amount, dec!(13));
    assert_eq!(stored.tax_amount, dec!(23.4));
    assert_eq!(stored.total, dec!(140.4));
    assert_eq!(Money::from(stored.total).to_string(), "140.40");

    let totals = stored.totals().unwrap();
    assert_eq!(totals.after_discount.amount(), dec!(117));

    assert_eq!(stored.items[0].unit, "h");
    assert_eq!(stored.items[0].line_total, dec!(100));
    assert_eq!(stored.items[1].unit, "pcs");
    assert_eq!(stored.terms.as_deref(), Some("Net 30"));
}

#[tokio::test]
async fn overdue_survives_refetch() {
    let db = database().await;
    let client_id = client(&db, "Slowpay").await;
    let service = db.invoices();

    let created = service.create(invoice(&client_id, -3)).await.unwrap();
    service.transition(&created.id, InvoiceTransition::Send).await.unwrap();

    assert_eq!(service.get(&created.id).await.unwrap().status, InvoiceStatus::Overdue);
    assert_eq!(service.get(&created.id).await.unwrap().status, InvoiceStatus::Overdue);

    let raw: String = sqlx::query_scalar("SELECT status FROM invoices WHERE id = ?1")
        .bind(&created.id)
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(raw, "overdue");
}

#[tokio::test]
async fn paying_a_late_invoice_goes_through_overdue() {
    let db = database().await;
    let client_id = client(&db, "Slowpay").await;
    let service = db.invoices();

    let created = service.create(invoice(&client_id, -1)).await.unwrap();
    service.transition(&created.id, InvoiceTransition::Send).await.unwrap();

    // No read in between: the transition itself applies the overdue check.
    let paid = service
        .transition(
            &created.id,
            InvoiceTransition::MarkPaid {
                payment_method: "card".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(paid.status, InvoiceStatus::Paid);
    assert!(paid.paid_date.is_some());

    let err = service
        .transition(&created.id, InvoiceTransition::Send)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::InvalidTransition { .. })));
}

#[tokio::test]
async fn mark_paid_needs_payment_method() {
    let db = database().await;
    let client_id = client(&db, "Acme").await;
    let service = db.invoices();

    let created = service.create(invoice(&client_id, 30)).await.unwrap();
    service.transition(&created.id, InvoiceTransition::Send).await.unwrap();

    let err = service
        .transition(
            &created.id,
            InvoiceTransition::MarkPaid {
                payment_method: "  ".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

    let stored = service.get(&created.id).await.unwrap();
    assert_eq!(stored.status, InvoiceStatus::Sent);
    assert_eq!(stored.paid_date, None);
}

#[tokio::test]
async fn failed_item_replacement_changes_nothing() {
    let db = database().await;
    let client_id = client(&db, "Acme").await;
    let service = db.invoices();
    let created = service.create(invoice(&client_id, 30)).await.unwrap();

    let mut too_many = vec![LineItemInput::new("Line", dec!(1), dec!(1)); 501];
    too_many[0].name = "First".to_string();
    assert!(service.replace_items(&created.id, &too_many).await.is_err());

    let stored = service.get(&created.id).await.unwrap();
    assert_eq!(stored.items.len(), 2);
    assert_eq!(stored.total, dec!(140.4));
    assert_eq!(stored.items[0].name, "Design");
}

#[tokio::test]
async fn oversized_amounts_are_rejected() {
    let db = database().await;
    let client_id = client(&db, "Acme").await;
    let service = db.invoices();

    let mut input = invoice(&client_id, 30);
    input.items = vec![LineItemInput::new("Huge", dec!(1e15), dec!(1e14))];
    let err = service.create(input).await.unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));

    let created = service.create(invoice(&client_id, 30)).await.unwrap();
    let err = service
        .replace_items(&created.id, &[LineItemInput::new("Huge", dec!(1e15), dec!(1e14))])
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    assert_eq!(service.get(&created.id).await.unwrap().total, dec!(140.4));
}

#[tokio::test]
async fn header_update_leaves_absent_fields_alone() {
    let db = database().await;
    let client_id = client(&db, "Acme").await;
    let service = db.invoices();
    let created = service.create(invoice(&client_id, 30)).await.unwrap();

    let updated = service
        .update_header(
            &created.id,
            InvoiceUpdate {
                title: Some("Website relaunch (final)".to_string()),
                description: Some(None),
                discount_pct: Some(dec!(0)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "Website relaunch (final)");
    assert_eq!(updated.description, None);
    assert_eq!(updated.terms.as_deref(), Some("Net 30"));
    assert_eq!(updated.tax_pct, dec!(20));
    assert_eq!(updated.total, dec!(156));
    assert_eq!(updated.invoice_number, created.invoice_number);

    let err = service
        .update_header(
            &created.id,
            InvoiceUpdate {
                discount_pct: Some(dec!(101)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
}

#[tokio::test]
async fn deleting_a_client_removes_its_documents() {
    let db = database().await;
    let keep = client(&db, "Keep").await;
    let gone = client(&db, "Gone").await;

    let kept = db.invoices().create(invoice(&keep, 30)).await.unwrap();
    let removed = db.invoices().create(invoice(&gone, 30)).await.unwrap();
    db.proposals()
        .create(NewProposal {
            client_id: gone.clone(),
            title: "Retainer".to_string(),
            number: None,
            description: None,
            valid_until: None,
            discount_pct: dec!(0),
            notes: None,
            terms: None,
            items: vec![LineItemInput::new("Support", dec!(10), dec!(80))],
        })
        .await
        .unwrap();

    db.clients().delete(&gone).await.unwrap();

    assert!(matches!(
        db.invoices().get(&removed.id).await.unwrap_err(),
        DbError::NotFound { .. }
    ));
    assert!(db.invoices().get(&kept.id).await.is_ok());
    assert!(db
        .proposals()
        .list(&ProposalFilter::default())
        .await
        .unwrap()
        .is_empty());

    let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoice_items WHERE invoice_id = ?1")
        .bind(&removed.id)
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(items, 0);
}

#[tokio::test]
async fn deleting_a_project_detaches_invoices() {
    let db = database().await;
    let client_id = client(&db, "Acme").await;
    let project = db
        .projects()
        .create(NewProject {
            client_id: client_id.clone(),
            name: "Relaunch".to_string(),
            description: None,
        })
        .await
        .unwrap();

    let mut input = invoice(&client_id, 30);
    input.project_id = Some(project.id.clone());
    let created = db.invoices().create(input).await.unwrap();

    let by_project = db
        .invoices()
        .list(&InvoiceFilter {
            project_id: Some(project.id.clone()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(by_project.len(), 1);

    db.projects().delete(&project.id).await.unwrap();
    assert_eq!(db.invoices().get(&created.id).await.unwrap().project_id, None);
}

#[tokio::test]
async fn list_pages_newest_first() {
    let db = database().await;
    let client_id = client(&db, "Acme").await;
    let mut numbers = Vec::new();
    for _ in 0..3 {
        numbers.push(db.invoices().create(invoice(&client_id, 30)).await.unwrap().invoice_number);
    }

    let page = db
        .invoices()
        .list(&InvoiceFilter {
            client_id: Some(client_id.clone()),
            offset: Some(1),
            limit: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(page.len(), 1);
    assert_eq!(page[0].invoice_number, numbers[1]);
}
