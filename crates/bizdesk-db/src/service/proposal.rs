//! # Proposal Service
//!
//! Proposals are numbered one of three ways:
//!
//! ```text
//! caller supplied "ACME-Q3"     → stored as-is; taken → Conflict at once
//! none + auto_number_proposals  → PRP-YYYYMM-NNNN with collision retry
//! none                          → stays unnumbered (can be set later once)
//! ```

use bizdesk_core::document::{
    NewProposal, Proposal, ProposalFilter, ProposalTransition, ProposalUpdate,
};
use bizdesk_core::lifecycle::ProposalStatus;
use bizdesk_core::numbering::NumberingPeriod;
use bizdesk_core::types::{DocumentKind, LineItemInput};
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::numbering::{next_number, number_column, with_number_retry};
use crate::pool::DocumentSettings;
use crate::repository::{items, proposal as repo};
use crate::tx::WriteTx;

/// Proposal operations over a shared pool.
#[derive(Debug, Clone)]
pub struct ProposalService {
    pool: SqlitePool,
    settings: DocumentSettings,
}

impl ProposalService {
    pub fn new(pool: SqlitePool, settings: DocumentSettings) -> Self {
        ProposalService { pool, settings }
    }

    /// Creates a draft proposal.
    pub async fn create(&self, input: NewProposal) -> DbResult<Proposal> {
        input.validate()?;

        let proposal = match input.requested_number() {
            Some(number) => insert_new(self.pool.clone(), input, Some(number.clone()), false)
                .await
                .map_err(|e| number_taken(e, &number))?,
            None if self.settings.auto_number_proposals => {
                with_number_retry(
                    DocumentKind::Proposal,
                    self.settings.numbering_retries,
                    |_| insert_new(self.pool.clone(), input.clone(), None, true),
                )
                .await?
            }
            None => insert_new(self.pool.clone(), input, None, false).await?,
        };

        info!(
            proposal_id = %proposal.id,
            number = ?proposal.number,
            total = %proposal.total,
            "Proposal created"
        );
        Ok(proposal)
    }

    pub async fn get(&self, id: &str) -> DbResult<Proposal> {
        let mut conn = self.pool.acquire().await?;
        repo::fetch(&mut conn, id).await
    }

    /// Lists proposals, newest first.
    pub async fn list(&self, filter: &ProposalFilter) -> DbResult<Vec<Proposal>> {
        let mut conn = self.pool.acquire().await?;
        repo::list(&mut conn, filter).await
    }

    /// Replaces the whole item list and recomputes totals.
    pub async fn replace_items(&self, id: &str, inputs: &[LineItemInput]) -> DbResult<Proposal> {
        let mut tx = WriteTx::begin(&self.pool).await?;
        let result: DbResult<Proposal> = async {
            let now = Utc::now();
            let mut proposal = repo::fetch(tx.conn(), id).await?;
            proposal.replace_items(inputs, now)?;

            items::replace(tx.conn(), DocumentKind::Proposal, id, &proposal.items).await?;
            repo::update(tx.conn(), &proposal).await?;
            Ok(proposal)
        }
        .await;
        let proposal = tx.finish(result).await?;

        info!(
            proposal_id = %id,
            items = proposal.items.len(),
            total = %proposal.total,
            "Proposal items replaced"
        );
        Ok(proposal)
    }

    /// Applies a partial header update. A number may be assigned once.
    pub async fn update_header(&self, id: &str, update: ProposalUpdate) -> DbResult<Proposal> {
        let requested = update.number.clone();

        let mut tx = WriteTx::begin(&self.pool).await?;
        let result: DbResult<Proposal> = async {
            let now = Utc::now();
            let mut proposal = repo::fetch(tx.conn(), id).await?;
            proposal.apply_update(update, now)?;

            repo::update(tx.conn(), &proposal).await?;
            Ok(proposal)
        }
        .await;
        let proposal = match requested {
            Some(number) => tx
                .finish(result)
                .await
                .map_err(|e| number_taken(e, number.trim()))?,
            None => tx.finish(result).await?,
        };

        info!(proposal_id = %id, total = %proposal.total, "Proposal header updated");
        Ok(proposal)
    }

    /// Moves a proposal along its lifecycle.
    pub async fn transition(&self, id: &str, transition: ProposalTransition) -> DbResult<Proposal> {
        let mut tx = WriteTx::begin(&self.pool).await?;
        let result: DbResult<(ProposalStatus, Proposal)> = async {
            let now = Utc::now();
            let mut proposal = repo::fetch(tx.conn(), id).await?;
            let from = proposal.transition(transition, now)?;

            repo::update(tx.conn(), &proposal).await?;
            Ok((from, proposal))
        }
        .await;
        let (from, proposal) = tx.finish(result).await?;

        info!(
            proposal_id = %id,
            number = ?proposal.number,
            from = %from,
            to = %proposal.status,
            "Proposal status changed"
        );
        Ok(proposal)
    }

    /// Deletes a proposal and its items.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        repo::delete(&mut conn, id).await?;

        info!(proposal_id = %id, "Proposal deleted");
        Ok(())
    }
}

/// Inserts a new proposal in its own transaction.
///
/// With `auto_number` set and no `number`, the next `PRP` number is
/// allocated inside the same transaction.
async fn insert_new(
    pool: SqlitePool,
    input: NewProposal,
    number: Option<String>,
    auto_number: bool,
) -> DbResult<Proposal> {
    let mut tx = WriteTx::begin(&pool).await?;
    let result: DbResult<Proposal> = async {
        let now = Utc::now();
        let number = match number {
            Some(number) => Some(number),
            None if auto_number => Some(
                next_number(tx.conn(), DocumentKind::Proposal, NumberingPeriod::of(now)).await?,
            ),
            None => None,
        };
        let proposal = Proposal::create(input, number, now)?;

        repo::insert(tx.conn(), &proposal).await?;
        debug!(proposal_id = %proposal.id, number = ?proposal.number, "Proposal row inserted");
        Ok(proposal)
    }
    .await;
    tx.finish(result).await
}

/// A caller-chosen number that already exists cannot succeed on retry.
fn number_taken(err: DbError, number: &str) -> DbError {
    if err.is_unique_violation_on(number_column(DocumentKind::Proposal)) {
        DbError::conflict(format!("proposal number '{number}' is already in use"))
    } else {
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use bizdesk_core::error::{CoreError, ValidationError};
    use bizdesk_core::types::NewClient;
    use rust_decimal_macros::dec;

    async fn setup(config: DbConfig) -> (Database, String) {
        let db = Database::new(config).await.unwrap();
        let client = db
            .clients()
            .create(NewClient {
                name: "Globex".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        (db, client.id)
    }

    fn new_proposal(client_id: &str, number: Option<&str>) -> NewProposal {
        NewProposal {
            client_id: client_id.to_string(),
            title: "Q3 retainer".to_string(),
            number: number.map(str::to_string),
            description: None,
            valid_until: None,
            discount_pct: dec!(10),
            notes: None,
            terms: None,
            items: vec![
                LineItemInput::new("Design", dec!(2), dec!(50)),
                LineItemInput::new("Hosting", dec!(1), dec!(30)),
            ],
        }
    }

    #[tokio::test]
    async fn test_create_without_number() {
        let (db, client_id) = setup(DbConfig::in_memory()).await;
        let proposal = db.proposals().create(new_proposal(&client_id, None)).await.unwrap();

        assert_eq!(proposal.number, None);
        assert_eq!(proposal.status, ProposalStatus::Draft);
        assert_eq!(proposal.subtotal, dec!(130));
        assert_eq!(proposal.total, dec!(117));

        let stored = db.proposals().get(&proposal.id).await.unwrap();
        assert_eq!(stored.items.len(), 2);
        assert_eq!(stored.total, dec!(117));
    }

    #[tokio::test]
    async fn test_create_with_auto_number() {
        let (db, client_id) = setup(DbConfig::in_memory().auto_number_proposals(true)).await;
        let first = db.proposals().create(new_proposal(&client_id, None)).await.unwrap();
        let second = db.proposals().create(new_proposal(&client_id, None)).await.unwrap();

        let period = NumberingPeriod::of(first.created_at);
        assert_eq!(first.number, Some(period.format(DocumentKind::Proposal, 1)));
        assert!(second.number.as_deref().unwrap_or_default().ends_with("-0002"));
    }

    #[tokio::test]
    async fn test_caller_number_wins_over_auto() {
        let (db, client_id) = setup(DbConfig::in_memory().auto_number_proposals(true)).await;
        let proposal = db
            .proposals()
            .create(new_proposal(&client_id, Some("  ACME-Q3 ")))
            .await
            .unwrap();
        assert_eq!(proposal.number.as_deref(), Some("ACME-Q3"));
    }

    #[tokio::test]
    async fn test_duplicate_number_is_conflict() {
        let (db, client_id) = setup(DbConfig::in_memory()).await;
        db.proposals()
            .create(new_proposal(&client_id, Some("ACME-Q3")))
            .await
            .unwrap();

        let err = db
            .proposals()
            .create(new_proposal(&client_id, Some("ACME-Q3")))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_number_set_once() {
        let (db, client_id) = setup(DbConfig::in_memory()).await;
        let proposal = db.proposals().create(new_proposal(&client_id, None)).await.unwrap();

        let numbered = db
            .proposals()
            .update_header(
                &proposal.id,
                ProposalUpdate {
                    number: Some("P-100".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(numbered.number.as_deref(), Some("P-100"));

        let err = db
            .proposals()
            .update_header(
                &proposal.id,
                ProposalUpdate {
                    number: Some("P-200".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::Immutable { .. }))
        ));
    }

    #[tokio::test]
    async fn test_update_to_taken_number_is_conflict() {
        let (db, client_id) = setup(DbConfig::in_memory()).await;
        db.proposals()
            .create(new_proposal(&client_id, Some("P-1")))
            .await
            .unwrap();
        let other = db.proposals().create(new_proposal(&client_id, None)).await.unwrap();

        let err = db
            .proposals()
            .update_header(
                &other.id,
                ProposalUpdate {
                    number: Some("P-1".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));

        assert_eq!(db.proposals().get(&other.id).await.unwrap().number, None);
    }

    #[tokio::test]
    async fn test_accept_locks_proposal() {
        let (db, client_id) = setup(DbConfig::in_memory()).await;
        let service = db.proposals();
        let proposal = service.create(new_proposal(&client_id, None)).await.unwrap();

        service.transition(&proposal.id, ProposalTransition::Send).await.unwrap();
        let accepted = service
            .transition(&proposal.id, ProposalTransition::Accept)
            .await
            .unwrap();
        assert_eq!(accepted.status, ProposalStatus::Accepted);

        let err = service
            .transition(&proposal.id, ProposalTransition::Reject)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidTransition { .. })));

        let err = service
            .replace_items(&proposal.id, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::DocumentLocked { .. })));
    }

    #[tokio::test]
    async fn test_replace_items_and_list() {
        let (db, client_id) = setup(DbConfig::in_memory()).await;
        let service = db.proposals();
        let proposal = service.create(new_proposal(&client_id, None)).await.unwrap();

        let updated = service
            .replace_items(&proposal.id, &[LineItemInput::new("Audit", dec!(4), dec!(25))])
            .await
            .unwrap();
        assert_eq!(updated.total, dec!(90));

        let drafts = service
            .list(&ProposalFilter {
                status: Some(ProposalStatus::Draft),
                client_id: Some(client_id.clone()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].items.len(), 1);
        assert_eq!(drafts[0].total, dec!(90));
    }

    #[tokio::test]
    async fn test_delete() {
        let (db, client_id) = setup(DbConfig::in_memory()).await;
        let proposal = db.proposals().create(new_proposal(&client_id, None)).await.unwrap();

        db.proposals().delete(&proposal.id).await.unwrap();
        assert!(matches!(
            db.proposals().get(&proposal.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }
}
