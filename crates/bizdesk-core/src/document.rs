//! # Document Aggregates
//!
//! In-memory invariants for invoices and proposals: a header plus an ordered
//! list of line items whose totals are always derived, never stored from input.
//!
//! ## Aggregate Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create          validate header + items → totals → status = draft     │
//! │  replace_items   validate new list → swap list → recompute totals      │
//! │  apply_update    validate fields → apply → recompute if rates changed  │
//! │  transition      lifecycle edge check → timestamps                     │
//! │  refresh_overdue sent + past due → overdue                             │
//! │                                                                         │
//! │  Every operation validates fully BEFORE it mutates, so an error        │
//! │  leaves the aggregate exactly as it was.                               │
//! │                                                                         │
//! │  Terminal documents (paid, cancelled, accepted, rejected) are locked:  │
//! │  items and header can no longer change.                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Persistence is not this module's concern; `bizdesk-db` loads, calls these
//! methods, and writes the result back inside one transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::lifecycle::{InvoiceStatus, Lifecycle, ProposalStatus};
use crate::money::Percentage;
use crate::totals::{apply_rates, compute_totals, DocumentTotals};
use crate::types::{LineItem, LineItemInput};
use crate::validation::{
    clamp_list_limit, validate_document_number, validate_item_count, validate_item_text,
    validate_payment_method, validate_title, ValidationResult,
};
use crate::valuation::valuate;

// =============================================================================
// Helpers
// =============================================================================

/// Distinguishes an absent field from an explicit `null`.
///
/// Used with `#[serde(default, deserialize_with = "deserialize_some")]` on
/// `Option<Option<T>>` fields: absent → `None`, `null` → `Some(None)`,
/// value → `Some(Some(v))`.
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Validates and materializes a caller's item list for one document.
///
/// Positions follow submission order. Errors carry the offending index.
pub fn build_line_items(
    document_id: &str,
    inputs: &[LineItemInput],
    now: DateTime<Utc>,
) -> ValidationResult<Vec<LineItem>> {
    validate_item_count(inputs.len())?;

    inputs
        .iter()
        .enumerate()
        .map(|(index, input)| {
            validate_item_text(index, &input.name, input.unit.as_deref())?;
            let line_total =
                valuate(input.quantity, input.unit_price).map_err(|e| e.at_item(index))?;

            Ok(LineItem {
                id: Uuid::new_v4().to_string(),
                document_id: document_id.to_string(),
                position: index as i64,
                name: input.name.trim().to_string(),
                description: input.description.clone(),
                quantity: input.quantity,
                unit: input.resolved_unit(),
                unit_price: input.unit_price,
                line_total: line_total.amount(),
                created_at: now,
            })
        })
        .collect()
}

/// True when a sent invoice's due date has passed.
///
/// A due date equal to `now` is not yet overdue.
pub fn is_past_due(status: InvoiceStatus, due_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    status == InvoiceStatus::Sent && due_date < now
}

fn ensure_editable<S: Lifecycle>(status: S, label: &str) -> CoreResult<()> {
    if status.is_terminal() {
        return Err(CoreError::DocumentLocked {
            document: label.to_string(),
            status: status.as_str().to_string(),
        });
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// =============================================================================
// Invoice
// =============================================================================

/// An invoice with its line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    /// `INV-YYYYMM-NNNN`, assigned at creation and never changed.
    pub invoice_number: String,
    pub client_id: String,
    pub project_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub status: InvoiceStatus,
    #[ts(as = "String")]
    pub discount_pct: Decimal,
    #[ts(as = "String")]
    pub tax_pct: Decimal,
    #[ts(as = "String")]
    pub subtotal: Decimal,
    #[ts(as = "String")]
    pub discount_amount: Decimal,
    #[ts(as = "String")]
    pub tax_amount: Decimal,
    #[ts(as = "String")]
    pub total: Decimal,
    #[ts(as = "String")]
    pub issue_date: DateTime<Utc>,
    #[ts(as = "String")]
    pub due_date: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub paid_date: Option<DateTime<Utc>>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub terms: Option<String>,
    pub items: Vec<LineItem>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an invoice.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewInvoice {
    pub client_id: String,
    #[serde(default)]
    pub project_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to the creation time.
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub issue_date: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    #[ts(as = "String")]
    pub discount_pct: Decimal,
    #[serde(default)]
    #[ts(as = "String")]
    pub tax_pct: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub terms: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItemInput>,
}

impl NewInvoice {
    /// Runs every check `Invoice::create` would, without building anything.
    ///
    /// Lets storage reject bad input before it allocates a number.
    pub fn validate(&self) -> ValidationResult<DocumentTotals> {
        validate_title(&self.title)?;
        for (index, item) in self.items.iter().enumerate() {
            validate_item_text(index, &item.name, item.unit.as_deref())?;
        }
        compute_totals(&self.items, self.discount_pct, Some(self.tax_pct))
    }
}

/// Partial header update for an invoice.
///
/// Absent fields are untouched. For nullable fields an explicit `null`
/// clears the value. Unknown fields, including `status`, are rejected:
/// status only changes through [`InvoiceTransition`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InvoiceUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub project_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_pct: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_pct: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub terms: Option<Option<String>>,
}

/// A requested invoice status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum InvoiceTransition {
    Send,
    MarkPaid { payment_method: String },
    MarkOverdue,
    Cancel,
}

impl InvoiceTransition {
    pub fn target(&self) -> InvoiceStatus {
        match self {
            InvoiceTransition::Send => InvoiceStatus::Sent,
            InvoiceTransition::MarkPaid { .. } => InvoiceStatus::Paid,
            InvoiceTransition::MarkOverdue => InvoiceStatus::Overdue,
            InvoiceTransition::Cancel => InvoiceStatus::Cancelled,
        }
    }
}

/// Filter and paging for invoice listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvoiceFilter {
    #[serde(default)]
    pub status: Option<InvoiceStatus>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl InvoiceFilter {
    pub fn limit(&self) -> i64 {
        clamp_list_limit(self.limit)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

impl Invoice {
    /// Builds a new draft invoice.
    ///
    /// `invoice_number` comes from the numbering allocator; `now` stamps the
    /// document and its items.
    pub fn create(
        input: NewInvoice,
        invoice_number: String,
        now: DateTime<Utc>,
    ) -> CoreResult<Invoice> {
        validate_title(&input.title)?;
        let id = Uuid::new_v4().to_string();
        let items = build_line_items(&id, &input.items, now)?;
        let totals = compute_totals(&items, input.discount_pct, Some(input.tax_pct))?;

        let mut invoice = Invoice {
            id,
            invoice_number,
            client_id: input.client_id,
            project_id: non_blank(input.project_id),
            title: input.title.trim().to_string(),
            description: input.description,
            status: InvoiceStatus::initial(),
            discount_pct: input.discount_pct,
            tax_pct: input.tax_pct,
            subtotal: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            total: Decimal::ZERO,
            issue_date: input.issue_date.unwrap_or(now),
            due_date: input.due_date,
            paid_date: None,
            payment_method: None,
            notes: input.notes,
            terms: input.terms,
            items,
            created_at: now,
            updated_at: now,
        };
        invoice.set_totals(totals);
        Ok(invoice)
    }

    /// Current totals recomputed from the stored items and rates.
    pub fn totals(&self) -> CoreResult<DocumentTotals> {
        Ok(compute_totals(
            &self.items,
            self.discount_pct,
            Some(self.tax_pct),
        )?)
    }

    /// Replaces the whole item list and recomputes totals.
    pub fn replace_items(&mut self, inputs: &[LineItemInput], now: DateTime<Utc>) -> CoreResult<()> {
        ensure_editable(self.status, &self.invoice_number)?;
        let items = build_line_items(&self.id, inputs, now)?;
        let totals = compute_totals(&items, self.discount_pct, Some(self.tax_pct))?;

        self.items = items;
        self.set_totals(totals);
        self.updated_at = now;
        Ok(())
    }

    /// Applies a partial header update.
    ///
    /// Rate changes recompute totals from the existing items.
    pub fn apply_update(&mut self, update: InvoiceUpdate, now: DateTime<Utc>) -> CoreResult<()> {
        ensure_editable(self.status, &self.invoice_number)?;

        if let Some(title) = &update.title {
            validate_title(title)?;
        }
        let discount = Percentage::discount(update.discount_pct.unwrap_or(self.discount_pct))?;
        let tax = Percentage::tax(update.tax_pct.unwrap_or(self.tax_pct))?;
        let subtotal = self.totals()?.subtotal;
        let totals = apply_rates(subtotal, discount, tax)?;

        if let Some(title) = update.title {
            self.title = title.trim().to_string();
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(project_id) = update.project_id {
            self.project_id = non_blank(project_id);
        }
        if let Some(due_date) = update.due_date {
            self.due_date = due_date;
        }
        if let Some(notes) = update.notes {
            self.notes = notes;
        }
        if let Some(terms) = update.terms {
            self.terms = terms;
        }

        self.discount_pct = discount.value();
        self.tax_pct = tax.value();
        self.set_totals(totals);
        self.updated_at = now;
        Ok(())
    }

    /// Moves the invoice along its lifecycle.
    ///
    /// A sent invoice that is already past due is first marked overdue, so
    /// paying it records `overdue → paid`. Returns the status it left.
    pub fn transition(
        &mut self,
        transition: InvoiceTransition,
        now: DateTime<Utc>,
    ) -> CoreResult<InvoiceStatus> {
        let target = transition.target();
        if let InvoiceTransition::MarkPaid { payment_method } = &transition {
            validate_payment_method(payment_method)?;
        }

        let from = if target != InvoiceStatus::Overdue
            && is_past_due(self.status, self.due_date, now)
        {
            InvoiceStatus::Overdue
        } else {
            self.status
        };
        let next = from.transition_to(target)?;

        if let InvoiceTransition::MarkPaid { payment_method } = transition {
            self.paid_date = Some(now);
            self.payment_method = Some(payment_method.trim().to_string());
        }

        self.status = next;
        self.updated_at = now;
        Ok(from)
    }

    /// Flips `sent` to `overdue` once the due date has passed.
    ///
    /// Returns whether the status changed.
    pub fn refresh_overdue(&mut self, now: DateTime<Utc>) -> bool {
        if is_past_due(self.status, self.due_date, now) {
            self.status = InvoiceStatus::Overdue;
            self.updated_at = now;
            true
        } else {
            false
        }
    }

    pub fn is_locked(&self) -> bool {
        self.status.is_terminal()
    }

    fn set_totals(&mut self, totals: DocumentTotals) {
        self.subtotal = totals.subtotal.amount();
        self.discount_amount = totals.discount_amount.amount();
        self.tax_amount = totals.tax_amount.amount();
        self.total = totals.total.amount();
    }
}

// =============================================================================
// Proposal
// =============================================================================

/// A commercial proposal with its line items. Proposals carry no tax.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Proposal {
    pub id: String,
    /// Free-form or auto-assigned; set at most once.
    pub number: Option<String>,
    pub client_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: ProposalStatus,
    #[ts(as = "String")]
    pub discount_pct: Decimal,
    #[ts(as = "String")]
    pub subtotal: Decimal,
    #[ts(as = "String")]
    pub discount_amount: Decimal,
    #[ts(as = "String")]
    pub total: Decimal,
    #[ts(as = "String")]
    pub issue_date: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
    pub terms: Option<String>,
    pub items: Vec<LineItem>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a proposal.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProposal {
    pub client_id: String,
    pub title: String,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub valid_until: Option<NaiveDate>,
    #[serde(default)]
    #[ts(as = "String")]
    pub discount_pct: Decimal,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub terms: Option<String>,
    #[serde(default)]
    pub items: Vec<LineItemInput>,
}

impl NewProposal {
    /// Runs every check `Proposal::create` would, without building anything.
    pub fn validate(&self) -> ValidationResult<DocumentTotals> {
        validate_title(&self.title)?;
        if let Some(number) = self.requested_number() {
            validate_document_number(&number)?;
        }
        for (index, item) in self.items.iter().enumerate() {
            validate_item_text(index, &item.name, item.unit.as_deref())?;
        }
        compute_totals(&self.items, self.discount_pct, None)
    }

    /// The caller's number, trimmed, if one was supplied.
    pub fn requested_number(&self) -> Option<String> {
        self.number
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
    }
}

/// Partial header update for a proposal.
///
/// `number` may be supplied only while the proposal has none, or with the
/// value it already has.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProposalUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub valid_until: Option<Option<NaiveDate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_pct: Option<Decimal>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "deserialize_some",
        skip_serializing_if = "Option::is_none"
    )]
    pub terms: Option<Option<String>>,
}

/// A requested proposal status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ProposalTransition {
    Send,
    Accept,
    Reject,
}

impl ProposalTransition {
    pub fn target(&self) -> ProposalStatus {
        match self {
            ProposalTransition::Send => ProposalStatus::Sent,
            ProposalTransition::Accept => ProposalStatus::Accepted,
            ProposalTransition::Reject => ProposalStatus::Rejected,
        }
    }
}

/// Filter and paging for proposal listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProposalFilter {
    #[serde(default)]
    pub status: Option<ProposalStatus>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub offset: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

impl ProposalFilter {
    pub fn limit(&self) -> i64 {
        clamp_list_limit(self.limit)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

impl Proposal {
    /// Builds a new draft proposal.
    ///
    /// `number` is the caller's value or an auto-assigned one; `None` leaves
    /// the proposal unnumbered.
    pub fn create(
        input: NewProposal,
        number: Option<String>,
        now: DateTime<Utc>,
    ) -> CoreResult<Proposal> {
        validate_title(&input.title)?;
        if let Some(number) = &number {
            validate_document_number(number)?;
        }
        let id = Uuid::new_v4().to_string();
        let items = build_line_items(&id, &input.items, now)?;
        let totals = compute_totals(&items, input.discount_pct, None)?;

        let mut proposal = Proposal {
            id,
            number: number.map(|n| n.trim().to_string()),
            client_id: input.client_id,
            title: input.title.trim().to_string(),
            description: input.description,
            status: ProposalStatus::initial(),
            discount_pct: input.discount_pct,
            subtotal: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            total: Decimal::ZERO,
            issue_date: now,
            valid_until: input.valid_until,
            notes: input.notes,
            terms: input.terms,
            items,
            created_at: now,
            updated_at: now,
        };
        proposal.set_totals(totals);
        Ok(proposal)
    }

    /// Number if assigned, otherwise the id. Used in error messages.
    pub fn label(&self) -> &str {
        self.number.as_deref().unwrap_or(&self.id)
    }

    pub fn totals(&self) -> CoreResult<DocumentTotals> {
        Ok(compute_totals(&self.items, self.discount_pct, None)?)
    }

    /// Replaces the whole item list and recomputes totals.
    pub fn replace_items(&mut self, inputs: &[LineItemInput], now: DateTime<Utc>) -> CoreResult<()> {
        ensure_editable(self.status, self.label())?;
        let items = build_line_items(&self.id, inputs, now)?;
        let totals = compute_totals(&items, self.discount_pct, None)?;

        self.items = items;
        self.set_totals(totals);
        self.updated_at = now;
        Ok(())
    }

    /// Applies a partial header update.
    pub fn apply_update(&mut self, update: ProposalUpdate, now: DateTime<Utc>) -> CoreResult<()> {
        ensure_editable(self.status, self.label())?;

        if let Some(title) = &update.title {
            validate_title(title)?;
        }
        let number = match (update.number.as_deref().map(str::trim), &self.number) {
            (None, _) => None,
            (Some(new), Some(current)) if new == current => None,
            (Some(_), Some(_)) => {
                return Err(ValidationError::Immutable {
                    field: "number".to_string(),
                }
                .into())
            }
            (Some(new), None) => {
                validate_document_number(new)?;
                Some(new.to_string())
            }
        };
        let discount = Percentage::discount(update.discount_pct.unwrap_or(self.discount_pct))?;
        let subtotal = self.totals()?.subtotal;
        let totals = apply_rates(subtotal, discount, Percentage::zero())?;

        if let Some(title) = update.title {
            self.title = title.trim().to_string();
        }
        if number.is_some() {
            self.number = number;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(valid_until) = update.valid_until {
            self.valid_until = valid_until;
        }
        if let Some(notes) = update.notes {
            self.notes = notes;
        }
        if let Some(terms) = update.terms {
            self.terms = terms;
        }

        self.discount_pct = discount.value();
        self.set_totals(totals);
        self.updated_at = now;
        Ok(())
    }

    /// Moves the proposal along its lifecycle. Returns the status it left.
    pub fn transition(
        &mut self,
        transition: ProposalTransition,
        now: DateTime<Utc>,
    ) -> CoreResult<ProposalStatus> {
        let from = self.status;
        self.status = from.transition_to(transition.target())?;
        self.updated_at = now;
        Ok(from)
    }

    pub fn is_locked(&self) -> bool {
        self.status.is_terminal()
    }

    fn set_totals(&mut self, totals: DocumentTotals) {
        self.subtotal = totals.subtotal.amount();
        self.discount_amount = totals.discount_amount.amount();
        self.total = totals.total.amount();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
