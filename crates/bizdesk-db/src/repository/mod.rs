//! # Repository Module
//!
//! SQL for every table lives here and nowhere else.
//!
//! ## Two Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Pool-owning repositories (single statement, no invariants to guard)   │
//! │  ├── ClientRepository    create / get_by_id / list / delete            │
//! │  └── ProjectRepository   create / get_by_id / list_for_client / delete │
//! │                                                                         │
//! │  Connection-level functions (composed by services inside a WriteTx)    │
//! │  ├── invoice::{insert, fetch, update, list, delete, mark_overdue}      │
//! │  ├── proposal::{insert, fetch, update, list, delete}                   │
//! │  └── items::{insert_all, fetch, replace}                               │
//! │                                                                         │
//! │  Documents and their items must change together, so their functions   │
//! │  take `&mut SqliteConnection` and never open a transaction themselves. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Decimal Columns
//!
//! Amounts are written with `Decimal::to_string()` and parsed back with
//! [`parse_decimal`]. A value that no longer parses is reported as
//! [`DbError::Corrupt`] instead of being silently zeroed.

pub mod client;
pub mod invoice;
pub mod items;
pub mod proposal;

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::error::{DbError, DbResult};

/// Parses a decimal TEXT column.
pub(crate) fn parse_decimal(entity: &str, field: &str, value: &str) -> DbResult<Decimal> {
    Decimal::from_str(value).map_err(|_| DbError::Corrupt {
        entity: entity.to_string(),
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Trims an optional text field and drops it when blank.
pub(crate) fn clean_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_decimal_keeps_scale() {
        let value = parse_decimal("Invoice", "total", "140.40").unwrap();
        assert_eq!(value, dec!(140.4));
        assert_eq!(value.to_string(), "140.40");
    }

    #[test]
    fn test_parse_decimal_reports_corruption() {
        let err = parse_decimal("Invoice", "total", "12,50").unwrap_err();
        assert!(matches!(
            err,
            DbError::Corrupt { ref field, ref value, .. } if field == "total" && value == "12,50"
        ));
    }

    #[test]
    fn test_clean_optional() {
        assert_eq!(clean_optional(Some("  a ".to_string())), Some("a".to_string()));
        assert_eq!(clean_optional(Some("   ".to_string())), None);
        assert_eq!(clean_optional(None), None);
    }
}
