//! # Proposal Commands
//!
//! `draft → sent → accepted | rejected`. Accepted and rejected proposals are
//! read-only. A number can be given at creation, set once later through
//! `update`, or assigned as `PRP-YYYYMM-NNNN` when auto numbering is on.

use std::path::PathBuf;

use bizdesk_core::{
    LineItemInput, Money, NewProposal, Proposal, ProposalFilter, ProposalStatus,
    ProposalTransition, ProposalUpdate,
};
use bizdesk_db::Database;
use clap::Subcommand;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::{deleted, read_json, to_output};
use crate::config::AppConfig;
use crate::error::ApiError;

#[derive(Debug, Subcommand)]
pub enum ProposalCommand {
    /// Create a draft proposal from a JSON file ("-" for stdin)
    Create {
        #[arg(long)]
        file: PathBuf,
    },

    /// Show a proposal with its items
    Show {
        id: String,

        /// Print formatted totals instead of the full document
        #[arg(long)]
        summary: bool,
    },

    /// List proposals, newest first
    List {
        #[arg(long)]
        status: Option<ProposalStatus>,
        #[arg(long)]
        client: Option<String>,
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        offset: Option<i64>,
    },

    /// Replace all line items from a JSON array
    Items {
        id: String,
        #[arg(long)]
        file: PathBuf,
    },

    /// Apply a partial header update from a JSON object
    Update {
        id: String,
        #[arg(long)]
        file: PathBuf,
    },

    /// Mark a draft proposal as sent
    Send { id: String },

    /// Record the client's acceptance
    Accept { id: String },

    /// Record the client's rejection
    Reject { id: String },

    /// Delete a proposal and its items
    Delete { id: String },
}

/// Human-readable totals for `proposal show --summary`.
#[derive(Debug, Serialize)]
pub struct ProposalSummary {
    pub label: String,
    pub title: String,
    pub status: ProposalStatus,
    pub items: usize,
    pub subtotal: String,
    pub discount: String,
    pub total: String,
    pub valid_until: Option<String>,
}

impl ProposalSummary {
    pub fn new(proposal: &Proposal, config: &AppConfig) -> Self {
        ProposalSummary {
            label: proposal.label().to_string(),
            title: proposal.title.clone(),
            status: proposal.status,
            items: proposal.items.len(),
            subtotal: config.format_currency(Money::from(proposal.subtotal)),
            discount: config.format_currency(Money::from(proposal.discount_amount)),
            total: config.format_currency(Money::from(proposal.total)),
            valid_until: proposal.valid_until.map(|d| d.to_string()),
        }
    }
}

pub async fn run(db: &Database, config: &AppConfig, command: ProposalCommand) -> Result<Value, ApiError> {
    let proposals = db.proposals();

    match command {
        ProposalCommand::Create { file } => {
            let input: NewProposal = read_json(&file)?;
            to_output(&proposals.create(input).await?)
        }
        ProposalCommand::Show { id, summary } => {
            let proposal = proposals.get(&id).await?;
            if summary {
                to_output(&ProposalSummary::new(&proposal, config))
            } else {
                to_output(&proposal)
            }
        }
        ProposalCommand::List {
            status,
            client,
            limit,
            offset,
        } => {
            let filter = ProposalFilter {
                status,
                client_id: client,
                offset,
                limit,
            };
            to_output(&proposals.list(&filter).await?)
        }
        ProposalCommand::Items { id, file } => {
            let items: Vec<LineItemInput> = read_json(&file)?;
            to_output(&proposals.replace_items(&id, &items).await?)
        }
        ProposalCommand::Update { id, file } => {
            let update: ProposalUpdate = read_json(&file)?;
            to_output(&proposals.update_header(&id, update).await?)
        }
        ProposalCommand::Send { id } => transition(db, &id, ProposalTransition::Send).await,
        ProposalCommand::Accept { id } => transition(db, &id, ProposalTransition::Accept).await,
        ProposalCommand::Reject { id } => transition(db, &id, ProposalTransition::Reject).await,
        ProposalCommand::Delete { id } => {
            proposals.delete(&id).await?;
            info!(proposal_id = %id, "Proposal deleted");
            Ok(deleted("proposal", &id))
        }
    }
}

async fn transition(db: &Database, id: &str, transition: ProposalTransition) -> Result<Value, ApiError> {
    let proposal = db.proposals().transition(id, transition).await?;
    to_output(&proposal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use bizdesk_core::NewClient;
    use bizdesk_db::DbConfig;
    use std::io::Write;

    async fn setup(auto_number: bool) -> (Database, String) {
        let db = Database::new(DbConfig::in_memory().auto_number_proposals(auto_number))
            .await
            .unwrap();
        let client = db
            .clients()
            .create(NewClient {
                name: "Acme".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        (db, client.id)
    }

    fn json_file(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    async fn create(db: &Database, config: &AppConfig, body: &str) -> Result<Value, ApiError> {
        let file = json_file(body);
        run(
            db,
            config,
            ProposalCommand::Create {
                file: file.path().to_path_buf(),
            },
        )
        .await
    }

    fn retainer(client_id: &str, number: Option<&str>) -> String {
        let number = number
            .map(|n| format!(r#""number": "{n}","#))
            .unwrap_or_default();
        format!(
            r#"{{
                "client_id": "{client_id}",
                {number}
                "title": "Support retainer",
                "valid_until": "2099-06-30",
                "discount_pct": "10",
                "items": [{{ "name": "Support", "quantity": "10", "unit": "h", "unit_price": "10" }}]
            }}"#
        )
    }

    #[tokio::test]
    async fn test_create_and_summary() {
        let (db, client_id) = setup(false).await;
        let config = AppConfig::default();

        let created = create(&db, &config, &retainer(&client_id, Some("Q-7"))).await.unwrap();
        assert_eq!(created["number"], "Q-7");
        let id = created["id"].as_str().unwrap().to_string();

        let summary = run(&db, &config, ProposalCommand::Show { id, summary: true })
            .await
            .unwrap();
        assert_eq!(summary["label"], "Q-7");
        assert_eq!(summary["subtotal"], "$100.00");
        assert_eq!(summary["discount"], "$10.00");
        assert_eq!(summary["total"], "$90.00");
        assert_eq!(summary["valid_until"], "2099-06-30");
    }

    #[tokio::test]
    async fn test_duplicate_number_is_conflict() {
        let (db, client_id) = setup(false).await;
        let config = AppConfig::default();

        create(&db, &config, &retainer(&client_id, Some("Q-7"))).await.unwrap();
        let err = create(&db, &config, &retainer(&client_id, Some("Q-7")))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert_eq!(err.status_code(), 409);
    }

    #[tokio::test]
    async fn test_auto_numbering() {
        let (db, client_id) = setup(true).await;
        let config = AppConfig::default();

        let created = create(&db, &config, &retainer(&client_id, None)).await.unwrap();
        assert!(created["number"].as_str().unwrap().starts_with("PRP-"));
    }

    #[tokio::test]
    async fn test_accepted_proposal_is_read_only() {
        let (db, client_id) = setup(false).await;
        let config = AppConfig::default();
        let created = create(&db, &config, &retainer(&client_id, None)).await.unwrap();
        assert!(created["number"].is_null());
        let id = created["id"].as_str().unwrap().to_string();

        run(&db, &config, ProposalCommand::Send { id: id.clone() }).await.unwrap();
        let accepted = run(&db, &config, ProposalCommand::Accept { id: id.clone() })
            .await
            .unwrap();
        assert_eq!(accepted["status"], "accepted");

        let err = run(&db, &config, ProposalCommand::Reject { id: id.clone() })
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTransition);

        let update = json_file(r#"{ "title": "Too late" }"#);
        let err = run(
            &db,
            &config,
            ProposalCommand::Update {
                id,
                file: update.path().to_path_buf(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::DocumentLocked);
    }

    #[tokio::test]
    async fn test_list_by_status() {
        let (db, client_id) = setup(false).await;
        let config = AppConfig::default();
        let first = create(&db, &config, &retainer(&client_id, None)).await.unwrap();
        create(&db, &config, &retainer(&client_id, None)).await.unwrap();
        let id = first["id"].as_str().unwrap().to_string();
        run(&db, &config, ProposalCommand::Send { id: id.clone() }).await.unwrap();

        let listed = run(
            &db,
            &config,
            ProposalCommand::List {
                status: Some(ProposalStatus::Sent),
                client: None,
                limit: None,
                offset: None,
            },
        )
        .await
        .unwrap();

        let listed = listed.as_array().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0]["id"], id.as_str());
    }
}
