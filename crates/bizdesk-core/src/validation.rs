//! # Validation Module
//!
//! Input validation rules for documents and their line items.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (CLI / HTTP)                                          │
//! │  └── Type validation (JSON deserialization)                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │  ├── title present and short enough                                    │
//! │  ├── item count, item names, non-negative quantities and prices        │
//! │  └── payment method present                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE document numbers                                           │
//! │  ├── CHECK status values                                               │
//! │  └── Foreign key constraints (client, project)                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bizdesk_core::validation::{validate_title, validate_item_count};
//!
//! assert!(validate_title("Website redesign").is_ok());
//! assert!(validate_item_count(3).is_ok());
//! ```

use crate::error::ValidationError;
use crate::{MAX_LINE_ITEMS, MAX_TITLE_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Page size used when a list request does not name one.
pub const DEFAULT_LIST_LIMIT: i64 = 100;

/// Largest page a single list request can return.
pub const MAX_LIST_LIMIT: i64 = 500;

const MAX_ITEM_NAME_LEN: usize = 200;
const MAX_UNIT_LEN: usize = 20;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a document title.
///
/// ## Rules
/// - Must not be empty (after trimming)
/// - At most [`MAX_TITLE_LEN`] characters
///
/// ## Example
/// ```rust
/// use bizdesk_core::validation::validate_title;
///
/// assert!(validate_title("Q1 retainer").is_ok());
/// assert!(validate_title("   ").is_err());
/// assert!(validate_title("A".repeat(201).as_str()).is_err());
/// ```
pub fn validate_title(title: &str) -> ValidationResult<()> {
    validate_required("title", title, MAX_TITLE_LEN)
}

/// Validates a required, length-limited text field (client name, project name).
pub fn validate_required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a line item name and unit at the given list position.
pub fn validate_item_text(index: usize, name: &str, unit: Option<&str>) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::InvalidItem {
            index,
            reason: "name is required".to_string(),
        });
    }

    if name.chars().count() > MAX_ITEM_NAME_LEN {
        return Err(ValidationError::InvalidItem {
            index,
            reason: format!("name must be at most {MAX_ITEM_NAME_LEN} characters"),
        });
    }

    if let Some(unit) = unit {
        if unit.trim().chars().count() > MAX_UNIT_LEN {
            return Err(ValidationError::InvalidItem {
                index,
                reason: format!("unit must be at most {MAX_UNIT_LEN} characters"),
            });
        }
    }

    Ok(())
}

/// Validates the payment method recorded when an invoice is paid.
pub fn validate_payment_method(method: &str) -> ValidationResult<()> {
    if method.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "payment_method".to_string(),
        });
    }
    Ok(())
}

/// Validates a caller-chosen proposal number.
///
/// Free-form, but must not be blank and must fit a reasonable column width.
pub fn validate_document_number(number: &str) -> ValidationResult<()> {
    let number = number.trim();

    if number.is_empty() {
        return Err(ValidationError::InvalidFormat {
            field: "number".to_string(),
            reason: "must not be blank".to_string(),
        });
    }

    if number.chars().count() > 50 {
        return Err(ValidationError::TooLong {
            field: "number".to_string(),
            max: 50,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of line items on one document.
///
/// Zero items is legal: a draft may be created empty and filled later.
pub fn validate_item_count(count: usize) -> ValidationResult<()> {
    if count > MAX_LINE_ITEMS {
        return Err(ValidationError::TooManyItems {
            max: MAX_LINE_ITEMS,
        });
    }
    Ok(())
}

/// Clamps a requested page size into `1..=MAX_LIST_LIMIT`.
pub fn clamp_list_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT)
}

// =============================================================================
// Unit Tests
// =============================================================================
