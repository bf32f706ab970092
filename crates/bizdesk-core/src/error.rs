//! # Error Types
//!
//! Domain-specific error types for bizdesk-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bizdesk-core errors (this file)                                       │
//! │  ├── CoreError        - Lifecycle and locking failures                 │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  bizdesk-db errors (separate crate)                                    │
//! │  └── DbError          - Storage, numbering and lookup failures         │
//! │                                                                         │
//! │  CLI errors (in app)                                                   │
//! │  └── ApiError         - What the caller sees (serialized)              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Caller       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (field, status, index)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations in the document engine.
/// None of them leave a document partially modified: every operation
/// validates before it mutates.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The requested status change is not an edge of the lifecycle graph.
    ///
    /// ## When This Occurs
    /// - Paying a draft invoice (it must be sent first)
    /// - Re-sending a paid invoice
    /// - Accepting a proposal that was never sent
    ///
    /// ## User Workflow
    /// ```text
    /// Invoice INV-202401-0003 (paid)
    ///      │
    ///      ▼
    /// send()
    ///      │
    ///      ▼
    /// InvalidTransition { from: "paid", to: "sent" }
    ///      │
    ///      ▼
    /// Caller shows: "Cannot change status from paid to sent"
    /// ```
    #[error("Cannot change status from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// The document is in a terminal status and can no longer be edited.
    #[error("Document {document} is {status} and can no longer be modified")]
    DocumentLocked { document: String, status: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before any state is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// A line item failed validation.
    ///
    /// `index` is the zero-based position in the submitted list.
    #[error("Line item {index} is invalid: {reason}")]
    InvalidItem { index: usize, reason: String },

    /// Discount percentage outside [0, 100].
    #[error("Discount must be between 0 and 100 percent, got {value}")]
    InvalidDiscount { value: String },

    /// Tax percentage outside [0, 100].
    #[error("Tax must be between 0 and 100 percent, got {value}")]
    InvalidTax { value: String },

    /// Too many line items on one document.
    #[error("A document cannot have more than {max} line items")]
    TooManyItems { max: usize },

    /// Field can only be set once.
    #[error("{field} is already assigned and cannot be changed")]
    Immutable { field: String },

    /// An amount does not fit the exact decimal range.
    #[error("{field} is out of range")]
    AmountOutOfRange { field: String },

    /// Invalid format (e.g., malformed document number, empty payment method).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Re-tags an item error with its position in the submitted list.
    ///
    /// Other variants pass through unchanged.
    pub fn at_item(self, position: usize) -> Self {
        match self {
            ValidationError::InvalidItem { reason, .. } => ValidationError::InvalidItem {
                index: position,
                reason,
            },
            other => other,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
