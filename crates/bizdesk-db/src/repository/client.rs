//! # Client & Project Repositories
//!
//! Minimal owners of documents. They exist so that `client_id` and
//! `project_id` are real foreign keys.
//!
//! ## Cascade Rules
//! ```text
//! DELETE client  → its projects, invoices, proposals (and their items) go
//! DELETE project → invoices keep existing with project_id = NULL
//! ```

use bizdesk_core::types::{Client, NewClient, NewProject, Project};
use bizdesk_core::validation::{clamp_list_limit, validate_required};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::clean_optional;

const MAX_NAME_LEN: usize = 200;

// =============================================================================
// Clients
// =============================================================================

/// Repository for client database operations.
///
/// ## Usage
/// ```rust,ignore
/// let clients = db.clients();
/// let acme = clients.create(NewClient { name: "Acme".into(), ..Default::default() }).await?;
/// let found = clients.get_by_id(&acme.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Inserts a new client.
    pub async fn create(&self, input: NewClient) -> DbResult<Client> {
        validate_required("name", &input.name, MAX_NAME_LEN)?;

        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4().to_string(),
            name: input.name.trim().to_string(),
            contact_person: clean_optional(input.contact_person),
            email: clean_optional(input.email),
            phone: clean_optional(input.phone),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO clients (id, name, contact_person, email, phone, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&client.id)
        .bind(&client.name)
        .bind(&client.contact_person)
        .bind(&client.email)
        .bind(&client.phone)
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(&self.pool)
        .await?;

        info!(client_id = %client.id, name = %client.name, "Client created");
        Ok(client)
    }

    /// Gets a client by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Client))` - Client found
    /// * `Ok(None)` - Client not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, name, contact_person, email, phone, created_at, updated_at
            FROM clients
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    /// Lists clients alphabetically.
    pub async fn list(&self, limit: Option<i64>, offset: Option<i64>) -> DbResult<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, name, contact_person, email, phone, created_at, updated_at
            FROM clients
            ORDER BY name COLLATE NOCASE, id
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(clamp_list_limit(limit))
        .bind(offset.unwrap_or(0).max(0))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = clients.len(), "Listed clients");
        Ok(clients)
    }

    /// Deletes a client together with everything it owns.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM clients WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", id));
        }

        info!(client_id = %id, "Client deleted");
        Ok(())
    }
}

// =============================================================================
// Projects
// =============================================================================

/// Repository for project database operations.
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    pool: SqlitePool,
}

impl ProjectRepository {
    /// Creates a new ProjectRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProjectRepository { pool }
    }

    /// Inserts a new project. The client must exist.
    pub async fn create(&self, input: NewProject) -> DbResult<Project> {
        validate_required("name", &input.name, MAX_NAME_LEN)?;

        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4().to_string(),
            client_id: input.client_id,
            name: input.name.trim().to_string(),
            description: clean_optional(input.description),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO projects (id, client_id, name, description, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&project.id)
        .bind(&project.client_id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(&self.pool)
        .await?;

        info!(project_id = %project.id, client_id = %project.client_id, "Project created");
        Ok(project)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, client_id, name, description, created_at, updated_at
            FROM projects
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(project)
    }

    /// Lists a client's projects, newest first.
    pub async fn list_for_client(&self, client_id: &str) -> DbResult<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, client_id, name, description, created_at, updated_at
            FROM projects
            WHERE client_id = ?1
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(projects)
    }

    /// Deletes a project. Invoices attached to it are detached, not removed.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Project", id));
        }

        info!(project_id = %id, "Project deleted");
        Ok(())
    }
}
