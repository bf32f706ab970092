//! # Document Lifecycle
//!
//! Status enums and the transition graph for both document kinds.
//!
//! ## Invoice
//! ```text
//!                    ┌──────► paid
//!                    │          ▲
//!  draft ──► sent ───┼──────► overdue
//!                    │          │
//!                    └──────► cancelled ◄┘
//! ```
//!
//! ## Proposal
//! ```text
//!  draft ──► sent ──┬──► accepted
//!                   └──► rejected
//! ```
//!
//! Anything not drawn is rejected with [`CoreError::InvalidTransition`].
//! Terminal statuses have no outgoing edges.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};

/// Shared state machine behavior for document statuses.
pub trait Lifecycle: Copy + Eq + fmt::Debug + Sized + 'static {
    /// The status every new document starts in.
    fn initial() -> Self;

    /// Statuses reachable in one step.
    fn allowed_next(&self) -> &'static [Self];

    /// Lowercase storage and display name.
    fn as_str(&self) -> &'static str;

    fn can_transition_to(&self, next: Self) -> bool {
        self.allowed_next().contains(&next)
    }

    fn is_terminal(&self) -> bool {
        self.allowed_next().is_empty()
    }

    /// Returns `next` if the edge exists, otherwise `InvalidTransition`.
    fn transition_to(self, next: Self) -> CoreResult<Self> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

// =============================================================================
// Invoice Status
// =============================================================================

/// The status of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Being prepared; items and header are editable.
    Draft,
    /// Issued to the client, awaiting payment.
    Sent,
    /// Payment recorded.
    Paid,
    /// Sent and past its due date without payment.
    Overdue,
    /// Withdrawn.
    Cancelled,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 5] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Sent,
        InvoiceStatus::Paid,
        InvoiceStatus::Overdue,
        InvoiceStatus::Cancelled,
    ];
}

impl Lifecycle for InvoiceStatus {
    fn initial() -> Self {
        InvoiceStatus::Draft
    }

    fn allowed_next(&self) -> &'static [Self] {
        use InvoiceStatus::*;
        match self {
            Draft => &[Sent],
            Sent => &[Paid, Overdue, Cancelled],
            Overdue => &[Paid, Cancelled],
            Paid | Cancelled => &[],
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Sent => "sent",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Draft
    }
}

// =============================================================================
// Proposal Status
// =============================================================================

/// The status of a commercial proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Draft,
    Sent,
    Accepted,
    Rejected,
}

impl ProposalStatus {
    pub const ALL: [ProposalStatus; 4] = [
        ProposalStatus::Draft,
        ProposalStatus::Sent,
        ProposalStatus::Accepted,
        ProposalStatus::Rejected,
    ];
}

impl Lifecycle for ProposalStatus {
    fn initial() -> Self {
        ProposalStatus::Draft
    }

    fn allowed_next(&self) -> &'static [Self] {
        use ProposalStatus::*;
        match self {
            Draft => &[Sent],
            Sent => &[Accepted, Rejected],
            Accepted | Rejected => &[],
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Draft => "draft",
            ProposalStatus::Sent => "sent",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Rejected => "rejected",
        }
    }
}

impl Default for ProposalStatus {
    fn default() -> Self {
        ProposalStatus::Draft
    }
}

// =============================================================================
// Display / FromStr
// =============================================================================

macro_rules! status_text {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase();
                <$ty>::ALL
                    .into_iter()
                    .find(|status| status.as_str() == wanted)
                    .ok_or_else(|| ValidationError::InvalidFormat {
                        field: "status".to_string(),
                        reason: format!(
                            "unknown status '{s}', expected one of: {}",
                            <$ty>::ALL.map(|st| st.as_str()).join(", ")
                        ),
                    })
            }
        }
    };
}

status_text!(InvoiceStatus);
status_text!(ProposalStatus);
