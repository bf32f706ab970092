//! # bizdesk-core: Pure Document Engine for Bizdesk
//!
//! This crate is the **heart** of Bizdesk. It contains the financial document
//! logic shared by proposals and invoices as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bizdesk Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Callers (CLI, HTTP layer, ...)                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │           bizdesk-db services (transactions, numbering)         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bizdesk-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │  ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌───────┐ │   │
//! │  │  │valuation │ │  totals  │ │numbering │ │lifecycle │ │document│ │   │
//! │  │  │ qty×price│ │ disc→tax │ │INV-YYYYMM│ │draft→sent│ │aggregate│ │   │
//! │  │  └──────────┘ └──────────┘ └──────────┘ └──────────┘ └───────┘ │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - `Money` and `Percentage` over exact decimals
//! - [`valuation`] - Line item valuator (`quantity × unit_price`)
//! - [`totals`] - Subtotal, discount, tax and grand total
//! - [`numbering`] - Document number format and sequence math
//! - [`lifecycle`] - Status enums and the transition state machine
//! - [`document`] - Invoice and Proposal aggregates and their inputs
//! - [`types`] - Line items and shared document types
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Same input = same output. The current time is always an argument.
//! 2. **No I/O**: Persistence lives in `bizdesk-db`.
//! 3. **Decimal Money**: All monetary values are `rust_decimal::Decimal`, never floats.
//! 4. **Explicit Errors**: All errors are typed, never strings or panics.
//!
//! ## Example Usage
//!
//! ```rust
//! use bizdesk_core::totals::compute_totals;
//! use bizdesk_core::types::LineItemInput;
//! use rust_decimal::Decimal;
//!
//! let items = vec![
//!     LineItemInput::new("Design", Decimal::from(2), Decimal::from(50)),
//!     LineItemInput::new("Hosting", Decimal::from(1), Decimal::from(30)),
//! ];
//!
//! let totals = compute_totals(&items, Decimal::from(10), Some(Decimal::from(20))).unwrap();
//! assert_eq!(totals.subtotal.amount(), Decimal::from(130));
//! assert_eq!(totals.total.amount(), Decimal::new(1404, 1)); // 140.4
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod document;
pub mod error;
pub mod lifecycle;
pub mod money;
pub mod numbering;
pub mod totals;
pub mod types;
pub mod validation;
pub mod valuation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use document::{
    Invoice, InvoiceFilter, InvoiceTransition, InvoiceUpdate, NewInvoice, NewProposal, Proposal,
    ProposalFilter, ProposalTransition, ProposalUpdate,
};
pub use error::{CoreError, CoreResult, ValidationError};
pub use lifecycle::{InvoiceStatus, Lifecycle, ProposalStatus};
pub use money::{Money, Percentage};
pub use numbering::NumberingPeriod;
pub use totals::DocumentTotals;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed on a single document.
///
/// Keeps a single replace-items transaction bounded.
pub const MAX_LINE_ITEMS: usize = 500;

/// Maximum length of a document title.
pub const MAX_TITLE_LEN: usize = 200;

/// Unit used when a line item does not name one.
pub const DEFAULT_UNIT: &str = "pcs";
