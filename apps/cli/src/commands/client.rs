//! # Client & Project Commands
//!
//! Minimal master data: documents reference a client, invoices optionally a
//! project. Deleting a client removes its projects and documents; deleting a
//! project detaches its invoices.

use bizdesk_core::{NewClient, NewProject};
use bizdesk_db::Database;
use clap::Subcommand;
use serde_json::Value;
use tracing::info;

use super::{deleted, to_output};
use crate::error::ApiError;

#[derive(Debug, Subcommand)]
pub enum ClientCommand {
    /// Create a client
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        contact: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },

    /// List clients alphabetically
    List {
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        offset: Option<i64>,
    },

    /// Show one client with its projects
    Show { id: String },

    /// Delete a client and everything issued to it
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
pub enum ProjectCommand {
    /// Create a project for a client
    Add {
        #[arg(long)]
        client: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },

    /// List a client's projects, newest first
    List {
        #[arg(long)]
        client: String,
    },

    /// Delete a project; its invoices stay, unassigned
    Delete { id: String },
}

pub async fn run_client(db: &Database, command: ClientCommand) -> Result<Value, ApiError> {
    let clients = db.clients();

    match command {
        ClientCommand::Add {
            name,
            contact,
            email,
            phone,
        } => {
            let client = clients
                .create(NewClient {
                    name,
                    contact_person: contact,
                    email,
                    phone,
                })
                .await?;
            to_output(&client)
        }
        ClientCommand::List { limit, offset } => to_output(&clients.list(limit, offset).await?),
        ClientCommand::Show { id } => {
            let client = clients
                .get_by_id(&id)
                .await?
                .ok_or_else(|| ApiError::not_found("Client", &id))?;
            let projects = db.projects().list_for_client(&id).await?;

            let mut output = to_output(&client)?;
            output["projects"] = to_output(&projects)?;
            Ok(output)
        }
        ClientCommand::Delete { id } => {
            clients.delete(&id).await?;
            info!(client_id = %id, "Client deleted");
            Ok(deleted("client", &id))
        }
    }
}

pub async fn run_project(db: &Database, command: ProjectCommand) -> Result<Value, ApiError> {
    let projects = db.projects();

    match command {
        ProjectCommand::Add {
            client,
            name,
            description,
        } => {
            let project = projects
                .create(NewProject {
                    client_id: client,
                    name,
                    description,
                })
                .await?;
            to_output(&project)
        }
        ProjectCommand::List { client } => to_output(&projects.list_for_client(&client).await?),
        ProjectCommand::Delete { id } => {
            projects.delete(&id).await?;
            info!(project_id = %id, "Project deleted");
            Ok(deleted("project", &id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use bizdesk_db::DbConfig;

    async fn database() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn add(name: &str) -> ClientCommand {
        ClientCommand::Add {
            name: name.to_string(),
            contact: None,
            email: Some("billing@example.com".to_string()),
            phone: None,
        }
    }

    #[tokio::test]
    async fn test_add_show_and_delete_client() {
        let db = database().await;
        let created = run_client(&db, add("Acme")).await.unwrap();
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["email"], "billing@example.com");

        run_project(
            &db,
            ProjectCommand::Add {
                client: id.clone(),
                name: "Relaunch".to_string(),
                description: None,
            },
        )
        .await
        .unwrap();

        let shown = run_client(&db, ClientCommand::Show { id: id.clone() }).await.unwrap();
        assert_eq!(shown["name"], "Acme");
        assert_eq!(shown["projects"].as_array().unwrap().len(), 1);

        let gone = run_client(&db, ClientCommand::Delete { id: id.clone() }).await.unwrap();
        assert_eq!(gone["deleted"], "client");

        let err = run_client(&db, ClientCommand::Show { id }).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_blank_name_is_a_validation_error() {
        let db = database().await;
        let err = run_client(&db, add("   ")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_project_for_unknown_client() {
        let db = database().await;
        let err = run_project(
            &db,
            ProjectCommand::Add {
                client: "missing".to_string(),
                name: "Ghost".to_string(),
                description: None,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.status_code(), 400);
    }
}
