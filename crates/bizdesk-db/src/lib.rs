//! # bizdesk-db: Storage Layer for Bizdesk
//!
//! Persists proposals and invoices in SQLite through sqlx, and owns every
//! rule that needs the database to hold: gap-free numbering, atomic item
//! replacement, lazy overdue reconciliation and cascading deletes.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bizdesk Data Flow                                │
//! │                                                                         │
//! │  CLI command (bizdesk invoice pay ...)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    bizdesk-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐   │   │
//! │  │   │   Services   │──►│ Repositories │   │   Migrations     │   │   │
//! │  │   │ InvoiceSvc   │   │ invoice.rs   │   │   (embedded)     │   │   │
//! │  │   │ ProposalSvc  │   │ proposal.rs  │   │ 001_initial.sql  │   │   │
//! │  │   └──────┬───────┘   │ items.rs     │   └──────────────────┘   │   │
//! │  │          │           │ client.rs    │                          │   │
//! │  │   ┌──────▼───────┐   └──────────────┘                          │   │
//! │  │   │ WriteTx +    │   ┌──────────────┐                          │   │
//! │  │   │ numbering    │   │   Database   │  SqlitePool + settings   │   │
//! │  │   └──────────────┘   │   (pool.rs)  │                          │   │
//! │  │                      └──────────────┘                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 SQLite Database (WAL, foreign keys on)          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, configuration and the `Database` handle
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`tx`] - `BEGIN IMMEDIATE` write transactions
//! - [`numbering`] - Number allocation with collision retry
//! - [`repository`] - SQL for clients, projects, documents and items
//! - [`service`] - Invoice and proposal units of work
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bizdesk_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("bizdesk.db")).await?;
//!
//! let invoice = db.invoices().create(new_invoice).await?;
//! let invoice = db.invoices().transition(&invoice.id, InvoiceTransition::Send).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod numbering;
pub mod pool;
pub mod repository;
pub mod service;
pub mod tx;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, DocumentSettings};

pub use repository::client::{ClientRepository, ProjectRepository};
pub use service::invoice::InvoiceService;
pub use service::proposal::ProposalService;
