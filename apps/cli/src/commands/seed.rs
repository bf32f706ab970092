//! # Demo Data
//!
//! `bizdesk seed` inserts one client with a project, three invoices in
//! different states and a sent proposal. Running it twice creates a second,
//! independent set.
//!
//! ```text
//! Northwind Studio
//! ├── project "Brand refresh"
//! ├── INV-…-n    draft    (attached to the project)
//! ├── INV-…-n+1  sent, due 14 days ago  ──► overdue on first read
//! ├── INV-…-n+2  paid
//! └── proposal   sent
//! ```

use bizdesk_core::{
    InvoiceTransition, LineItemInput, NewClient, NewInvoice, NewProject, NewProposal,
    ProposalTransition,
};
use bizdesk_db::Database;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiError;

fn design_items() -> Vec<LineItemInput> {
    vec![
        LineItemInput::new("Logo design", Decimal::from(12), Decimal::from(85))
            .with_unit("h")
            .with_description("Three concepts, two revision rounds"),
        LineItemInput::new("Style guide", Decimal::ONE, Decimal::from(450)),
    ]
}

fn hosting_items() -> Vec<LineItemInput> {
    vec![LineItemInput::new("Hosting", Decimal::from(3), Decimal::new(2499, 2)).with_unit("month")]
}

pub async fn run(db: &Database) -> Result<Value, ApiError> {
    let now = Utc::now();

    let client = db
        .clients()
        .create(NewClient {
            name: "Northwind Studio".to_string(),
            contact_person: Some("Dana Reyes".to_string()),
            email: Some("accounts@northwind.example".to_string()),
            phone: None,
        })
        .await?;

    let project = db
        .projects()
        .create(NewProject {
            client_id: client.id.clone(),
            name: "Brand refresh".to_string(),
            description: Some("Logo, palette and guidelines".to_string()),
        })
        .await?;

    let invoices = db.invoices();

    let draft = invoices
        .create(NewInvoice {
            client_id: client.id.clone(),
            project_id: Some(project.id.clone()),
            title: "Brand refresh, phase 1".to_string(),
            description: None,
            issue_date: None,
            due_date: now + Duration::days(30),
            discount_pct: Decimal::from(5),
            tax_pct: Decimal::from(20),
            notes: None,
            terms: Some("Net 30".to_string()),
            items: design_items(),
        })
        .await?;

    let late = invoices
        .create(NewInvoice {
            client_id: client.id.clone(),
            project_id: None,
            title: "Hosting, last quarter".to_string(),
            description: None,
            issue_date: Some(now - Duration::days(44)),
            due_date: now - Duration::days(14),
            discount_pct: Decimal::ZERO,
            tax_pct: Decimal::from(20),
            notes: Some("Reminder sent".to_string()),
            terms: Some("Net 30".to_string()),
            items: hosting_items(),
        })
        .await?;
    invoices.transition(&late.id, InvoiceTransition::Send).await?;

    let settled = invoices
        .create(NewInvoice {
            client_id: client.id.clone(),
            project_id: None,
            title: "Hosting, this quarter".to_string(),
            description: None,
            issue_date: None,
            due_date: now + Duration::days(30),
            discount_pct: Decimal::ZERO,
            tax_pct: Decimal::from(20),
            notes: None,
            terms: None,
            items: hosting_items(),
        })
        .await?;
    invoices.transition(&settled.id, InvoiceTransition::Send).await?;
    invoices
        .transition(
            &settled.id,
            InvoiceTransition::MarkPaid {
                payment_method: "bank transfer".to_string(),
            },
        )
        .await?;

    let proposals = db.proposals();
    let proposal = proposals
        .create(NewProposal {
            client_id: client.id.clone(),
            title: "Brand refresh, phase 2".to_string(),
            number: None,
            description: Some("Website templates".to_string()),
            valid_until: Some((now + Duration::days(21)).date_naive()),
            discount_pct: Decimal::from(10),
            notes: None,
            terms: None,
            items: vec![LineItemInput::new("Template design", Decimal::from(40), Decimal::from(85))
                .with_unit("h")],
        })
        .await?;
    let proposal = proposals.transition(&proposal.id, ProposalTransition::Send).await?;

    info!(client_id = %client.id, "Seeded demo data");

    Ok(json!({
        "client_id": client.id,
        "project_id": project.id,
        "invoices": [draft.invoice_number, late.invoice_number, settled.invoice_number],
        "proposal_id": proposal.id,
        "proposal_number": proposal.number,
    }))
}
