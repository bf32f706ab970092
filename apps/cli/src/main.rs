//! # Bizdesk CLI Entry Point
//!
//! ## Startup Sequence
//! 1. Initialize tracing (stderr)
//! 2. Parse arguments
//! 3. Load configuration & open the database (migrations run on open)
//! 4. Execute the command
//! 5. Print the result, or the error, as JSON

use std::process::ExitCode;

use bizdesk_cli::{init_tracing, run, Cli};
use clap::Parser;

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(output) => match serde_json::to_string_pretty(&output) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("failed to render output: {e}");
                ExitCode::FAILURE
            }
        },
        Err(err) => {
            let body = serde_json::to_string_pretty(&err).unwrap_or_else(|_| err.to_string());
            eprintln!("{body}");
            ExitCode::FAILURE
        }
    }
}
