//! # Bizdesk Command Line
//!
//! Operator CLI over the proposal and invoice engine.
//!
//! ## Application Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           bizdesk (binary)                              │
//! │                                                                         │
//! │  main.rs ────► init_tracing, Cli::parse, run, print JSON               │
//! │                                                                         │
//! │  lib.rs ─────► Cli definition, run (config + database + dispatch)      │
//! │                                                                         │
//! │  commands/ ──► client, project, invoice, proposal, next-number, seed   │
//! │                                                                         │
//! │  config.rs ──► AppConfig from BIZDESK_* variables                      │
//! │                                                                         │
//! │  error.rs ───► ApiError { code, status, message }                      │
//! │                                 │                                       │
//! │                                 ▼                                       │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                   bizdesk-db services                            │  │
//! │  │  InvoiceService / ProposalService / Client & Project repos       │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                 │                                       │
//! │                                 ▼                                       │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  bizdesk.db (local file, WAL mode, foreign keys on)              │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Output Contract
//! - success: pretty JSON on stdout, exit code 0
//! - failure: `ApiError` as JSON on stderr, exit code 1
//! - logs: stderr, filtered by `RUST_LOG`

use std::path::PathBuf;

use bizdesk_db::Database;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

pub mod commands;
pub mod config;
pub mod error;

use commands::client::{ClientCommand, ProjectCommand};
use commands::invoice::InvoiceCommand;
use commands::proposal::ProposalCommand;
use commands::NextNumberArgs;
use config::AppConfig;
use error::ApiError;

// =============================================================================
// Command Line Definition
// =============================================================================

/// Proposals and invoices from the command line.
#[derive(Debug, Parser)]
#[command(name = "bizdesk", version, about)]
pub struct Cli {
    /// SQLite database file (overrides BIZDESK_DB_PATH)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage clients
    #[command(subcommand)]
    Client(ClientCommand),

    /// Manage client projects
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Create, edit and move invoices through their lifecycle
    #[command(subcommand)]
    Invoice(InvoiceCommand),

    /// Create, edit and move proposals through their lifecycle
    #[command(subcommand)]
    Proposal(ProposalCommand),

    /// Preview the next auto-assigned document number
    NextNumber(NextNumberArgs),

    /// Insert a demo client with a project, invoices and a proposal
    Seed,
}

// =============================================================================
// Entry Points
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Logs go to stderr so stdout carries only JSON output.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=bizdesk_db=trace` - Trace the storage layer only
/// - Default: `info,bizdesk=debug,sqlx=warn`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bizdesk=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads configuration, opens the database and executes one command.
pub async fn run(cli: Cli) -> Result<Value, ApiError> {
    let mut config = AppConfig::from_env()?;
    if let Some(path) = cli.db {
        config.db_path = path;
    }

    info!(db_path = ?config.db_path, "Opening database");
    let db = Database::new(config.db_config()).await?;

    let result = execute(&db, &config, cli.command).await;
    db.close().await;
    result
}

/// Dispatches a parsed command against an open database.
pub async fn execute(db: &Database, config: &AppConfig, command: Command) -> Result<Value, ApiError> {
    debug!(?command, "Executing command");

    match command {
        Command::Client(cmd) => commands::client::run_client(db, cmd).await,
        Command::Project(cmd) => commands::client::run_project(db, cmd).await,
        Command::Invoice(cmd) => commands::invoice::run(db, config, cmd).await,
        Command::Proposal(cmd) => commands::proposal::run(db, config, cmd).await,
        Command::NextNumber(args) => commands::next_number(db, args).await,
        Command::Seed => commands::seed::run(db).await,
    }
}
