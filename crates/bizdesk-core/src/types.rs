//! # Domain Types
//!
//! Shared types used by both document kinds and by the storage layer.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Client      │   │     Project     │   │  DocumentKind   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  client_id (FK) │   │  Invoice  (INV) │       │
//! │  │  name           │   │  name           │   │  Proposal (PRP) │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │  LineItemInput  │──►│    LineItem     │  line_total is derived,     │
//! │  │  (caller data)  │   │  (stored row)   │  never accepted from input  │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every document has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business number: (`INV-202401-0001`) - human-readable, assigned once

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::DEFAULT_UNIT;

// =============================================================================
// Document Kind
// =============================================================================

/// The two financial document types sharing this engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Invoice,
    Proposal,
}

impl DocumentKind {
    /// Number prefix for auto-assigned numbers.
    pub const fn prefix(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "INV",
            DocumentKind::Proposal => "PRP",
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "invoice",
            DocumentKind::Proposal => "proposal",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Line Item Input
// =============================================================================

fn default_quantity() -> Decimal {
    Decimal::ONE
}

/// A line item as submitted by a caller.
///
/// There is no `line_total` field: totals are always derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItemInput {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Defaults to 1 when omitted.
    #[serde(default = "default_quantity")]
    #[ts(as = "String")]
    pub quantity: Decimal,
    /// Defaults to [`DEFAULT_UNIT`] when omitted or blank.
    #[serde(default)]
    pub unit: Option<String>,
    #[ts(as = "String")]
    pub unit_price: Decimal,
}

impl LineItemInput {
    /// Convenience constructor with no description and the default unit.
    pub fn new(name: impl Into<String>, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            name: name.into(),
            description: None,
            quantity,
            unit: None,
            unit_price,
        }
    }

    /// Sets the unit of measure.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The unit to store: the trimmed caller value, or the default.
    pub fn resolved_unit(&self) -> String {
        match self.unit.as_deref().map(str::trim) {
            Some(unit) if !unit.is_empty() => unit.to_string(),
            _ => DEFAULT_UNIT.to_string(),
        }
    }
}

// =============================================================================
// Line Item
// =============================================================================

/// A stored line item, owned by exactly one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    pub id: String,
    /// Invoice or proposal this item belongs to.
    pub document_id: String,
    /// Zero-based submission order.
    pub position: i64,
    pub name: String,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub quantity: Decimal,
    pub unit: String,
    #[ts(as = "String")]
    pub unit_price: Decimal,
    /// Always `quantity × unit_price`.
    #[ts(as = "String")]
    pub line_total: Decimal,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl LineItem {
    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::new(self.line_total)
    }
}

// =============================================================================
// Client & Project
// =============================================================================

/// A customer that documents are issued to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a client.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewClient {
    pub name: String,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// A client project that invoices may be attached to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Project {
    pub id: String,
    pub client_id: String,
    pub name: String,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewProject {
    pub client_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

// =============================================================================
// Unit Tests
// =============================================================================
