//! # Document Services
//!
//! Units of work over invoices and proposals. Each public method is one
//! call from the outside world and at most one write transaction.
//!
//! ## Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  service.replace_items(id, items)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  WriteTx::begin ─────────────────────────────────────────┐              │
//! │       │                                                  │              │
//! │       ▼                                                  │ same         │
//! │  repository::invoice::fetch        (header + items)      │ connection   │
//! │       │                                                  │              │
//! │       ▼                                                  │              │
//! │  Invoice::refresh_overdue + Invoice::replace_items       │ pure core    │
//! │       │                                                  │              │
//! │       ▼                                                  │              │
//! │  repository::items::replace + repository::invoice::update│              │
//! │       │                                                  │              │
//! │       ▼                                                  │              │
//! │  tx.finish(result)  Ok → COMMIT, Err → ROLLBACK ─────────┘              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Services never hold a pooled connection while acquiring another one: an
//! in-memory database has exactly one.

pub mod invoice;
pub mod proposal;
