//! # Document Numbering
//!
//! Formatting, parsing and sequence math for human-readable document numbers.
//!
//! ```text
//!   INV-202401-0007
//!   ─┬─ ──┬─── ─┬──
//!    │    │     └── sequence within the period (zero-padded to 4, may grow)
//!    │    └──────── period: year + month of creation
//!    └───────────── document kind prefix
//! ```
//!
//! Allocation itself lives in the storage layer: it scans the numbers that
//! already exist for a period and calls [`next_sequence`] inside a write
//! transaction. This module only knows the format.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::types::DocumentKind;
use crate::validation::ValidationResult;

/// Minimum width of the sequence part.
pub const SEQUENCE_WIDTH: usize = 4;

/// The (year, month) scope a sequence counts within.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NumberingPeriod {
    year: i32,
    month: u32,
}

impl NumberingPeriod {
    /// Builds a period, rejecting months outside 1..=12 and years outside 0..=9999.
    pub fn new(year: i32, month: u32) -> ValidationResult<Self> {
        if !(1..=12).contains(&month) {
            return Err(ValidationError::InvalidFormat {
                field: "month".to_string(),
                reason: format!("must be between 1 and 12, got {month}"),
            });
        }
        if !(0..=9999).contains(&year) {
            return Err(ValidationError::InvalidFormat {
                field: "year".to_string(),
                reason: format!("must have four digits, got {year}"),
            });
        }
        Ok(Self { year, month })
    }

    /// The period a document created at `at` is numbered in.
    pub fn of(at: DateTime<Utc>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// `"INV-202401"`: everything before the sequence separator.
    pub fn prefix(&self, kind: DocumentKind) -> String {
        format!("{}-{}", kind.prefix(), self)
    }

    /// Formats a full document number.
    ///
    /// ## Example
    /// ```rust
    /// use bizdesk_core::numbering::NumberingPeriod;
    /// use bizdesk_core::types::DocumentKind;
    ///
    /// let period = NumberingPeriod::new(2024, 1).unwrap();
    /// assert_eq!(period.format(DocumentKind::Invoice, 7), "INV-202401-0007");
    /// assert_eq!(period.format(DocumentKind::Invoice, 12345), "INV-202401-12345");
    /// ```
    pub fn format(&self, kind: DocumentKind, sequence: u32) -> String {
        format!(
            "{}-{:0width$}",
            self.prefix(kind),
            sequence,
            width = SEQUENCE_WIDTH
        )
    }
}

impl fmt::Display for NumberingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}{:02}", self.year, self.month)
    }
}

/// Extracts the sequence from `number` if it belongs to `kind` and `period`.
///
/// Numbers from other periods, other kinds, or free-form proposal numbers
/// return `None`.
pub fn parse_sequence(kind: DocumentKind, period: NumberingPeriod, number: &str) -> Option<u32> {
    let prefix = period.prefix(kind);
    let suffix = number.strip_prefix(prefix.as_str())?.strip_prefix('-')?;

    if suffix.len() < SEQUENCE_WIDTH || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

/// `max(existing sequences in period) + 1`, or 1 when the period is empty.
///
/// ## Example
/// ```rust
/// use bizdesk_core::numbering::{next_sequence, NumberingPeriod};
/// use bizdesk_core::types::DocumentKind;
///
/// let period = NumberingPeriod::new(2024, 3).unwrap();
/// let existing = ["INV-202403-0001", "INV-202403-0004", "INV-202402-0009"];
/// assert_eq!(next_sequence(DocumentKind::Invoice, period, existing), 5);
/// ```
pub fn next_sequence<'a, I>(kind: DocumentKind, period: NumberingPeriod, existing: I) -> u32
where
    I: IntoIterator<Item = &'a str>,
{
    existing
        .into_iter()
        .filter_map(|number| parse_sequence(kind, period, number))
        .max()
        .map_or(1, |max| max.saturating_add(1))
}
