//! # Invoice Commands
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   create ──► draft ──send──► sent ──pay──► paid                         │
//! │                               │  ▲                                      │
//! │                    overdue /  │  │ (past due_date, applied on read)    │
//! │                               ▼  │                                      │
//! │                             overdue ──pay──► paid                       │
//! │                                                                         │
//! │   sent | overdue ──cancel──► cancelled                                  │
//! │                                                                         │
//! │   items / update: rejected once paid or cancelled                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use bizdesk_core::{
    Invoice, InvoiceFilter, InvoiceStatus, InvoiceTransition, InvoiceUpdate, LineItemInput, Money,
    NewInvoice,
};
use bizdesk_db::Database;
use clap::Subcommand;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::{deleted, read_json, to_output};
use crate::config::AppConfig;
use crate::error::ApiError;

#[derive(Debug, Subcommand)]
pub enum InvoiceCommand {
    /// Create a draft invoice from a JSON file ("-" for stdin)
    Create {
        #[arg(long)]
        file: PathBuf,
    },

    /// Show an invoice with its items
    Show {
        id: String,

        /// Print formatted totals instead of the full document
        #[arg(long)]
        summary: bool,
    },

    /// List invoices, newest first
    List {
        #[arg(long)]
        status: Option<InvoiceStatus>,
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        offset: Option<i64>,
    },

    /// Replace all line items from a JSON array
    Items {
        id: String,
        #[arg(long)]
        file: PathBuf,
    },

    /// Apply a partial header update from a JSON object
    Update {
        id: String,
        #[arg(long)]
        file: PathBuf,
    },

    /// Mark a draft invoice as sent
    Send { id: String },

    /// Record payment
    Pay {
        id: String,
        #[arg(long)]
        method: String,
    },

    /// Flag a sent invoice as overdue
    Overdue { id: String },

    /// Cancel a sent or overdue invoice
    Cancel { id: String },

    /// Delete an invoice and its items
    Delete { id: String },
}

/// Human-readable totals for `invoice show --summary`.
#[derive(Debug, Serialize)]
pub struct InvoiceSummary {
    pub invoice_number: String,
    pub title: String,
    pub status: InvoiceStatus,
    pub items: usize,
    pub subtotal: String,
    pub discount: String,
    pub tax: String,
    pub total: String,
    pub due_date: String,
}

impl InvoiceSummary {
    pub fn new(invoice: &Invoice, config: &AppConfig) -> Self {
        InvoiceSummary {
            invoice_number: invoice.invoice_number.clone(),
            title: invoice.title.clone(),
            status: invoice.status,
            items: invoice.items.len(),
            subtotal: config.format_currency(Money::from(invoice.subtotal)),
            discount: config.format_currency(Money::from(invoice.discount_amount)),
            tax: config.format_currency(Money::from(invoice.tax_amount)),
            total: config.format_currency(Money::from(invoice.total)),
            due_date: invoice.due_date.format("%Y-%m-%d").to_string(),
        }
    }
}

pub async fn run(db: &Database, config: &AppConfig, command: InvoiceCommand) -> Result<Value, ApiError> {
    let invoices = db.invoices();

    match command {
        InvoiceCommand::Create { file } => {
            let input: NewInvoice = read_json(&file)?;
            to_output(&invoices.create(input).await?)
        }
        InvoiceCommand::Show { id, summary } => {
            let invoice = invoices.get(&id).await?;
            if summary {
                to_output(&InvoiceSummary::new(&invoice, config))
            } else {
                to_output(&invoice)
            }
        }
        InvoiceCommand::List {
            status,
            client,
            project,
            limit,
            offset,
        } => {
            let filter = InvoiceFilter {
                status,
                client_id: client,
                project_id: project,
                offset,
                limit,
            };
            to_output(&invoices.list(&filter).await?)
        }
        InvoiceCommand::Items { id, file } => {
            let items: Vec<LineItemInput> = read_json(&file)?;
            to_output(&invoices.replace_items(&id, &items).await?)
        }
        InvoiceCommand::Update { id, file } => {
            let update: InvoiceUpdate = read_json(&file)?;
            to_output(&invoices.update_header(&id, update).await?)
        }
        InvoiceCommand::Send { id } => transition(db, &id, InvoiceTransition::Send).await,
        InvoiceCommand::Pay { id, method } => {
            transition(
                db,
                &id,
                InvoiceTransition::MarkPaid {
                    payment_method: method,
                },
            )
            .await
        }
        InvoiceCommand::Overdue { id } => transition(db, &id, InvoiceTransition::MarkOverdue).await,
        InvoiceCommand::Cancel { id } => transition(db, &id, InvoiceTransition::Cancel).await,
        InvoiceCommand::Delete { id } => {
            invoices.delete(&id).await?;
            info!(invoice_id = %id, "Invoice deleted");
            Ok(deleted("invoice", &id))
        }
    }
}

async fn transition(db: &Database, id: &str, transition: InvoiceTransition) -> Result<Value, ApiError> {
    let invoice = db.invoices().transition(id, transition).await?;
    to_output(&invoice)
}
