//! # Write Transactions
//!
//! Every mutating unit of work runs inside one `BEGIN IMMEDIATE` transaction.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  WriteTx::begin(pool)   acquire conn, BEGIN IMMEDIATE (takes the        │
//! │         │               write lock now, waits up to busy_timeout)      │
//! │         ▼                                                               │
//! │  work(tx.conn())        reads + writes see one consistent snapshot     │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  tx.finish(result)      Ok  → COMMIT                                   │
//! │                         Err → ROLLBACK, original error returned        │
//! │                                                                         │
//! │  Dropped without finish (cancelled future) → the connection is closed  │
//! │  instead of going back to the pool mid-transaction.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A deferred `BEGIN` would start as a reader and fail with `SQLITE_BUSY`
//! when it later tries to write while another writer committed in between.
//! Taking the lock up front makes writers queue instead, which is what keeps
//! scan-based numbering gap-free under concurrency.

use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use tracing::warn;

use crate::error::{DbError, DbResult};

/// An open write transaction on a pooled connection.
pub struct WriteTx {
    conn: PoolConnection<Sqlite>,
    finished: bool,
}

impl WriteTx {
    /// Acquires a connection and takes the database write lock.
    pub async fn begin(pool: &SqlitePool) -> DbResult<Self> {
        let mut conn = pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .map_err(|e| DbError::TransactionFailed(format!("begin: {e}")))?;

        Ok(WriteTx {
            conn,
            finished: false,
        })
    }

    /// The connection to run statements on.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.conn
    }

    /// Commits on `Ok`, rolls back on `Err`, and passes the outcome through.
    pub async fn finish<T>(mut self, outcome: DbResult<T>) -> DbResult<T> {
        match outcome {
            Ok(value) => {
                if let Err(e) = sqlx::query("COMMIT").execute(&mut *self.conn).await {
                    self.rollback().await;
                    return Err(DbError::TransactionFailed(format!("commit: {e}")));
                }
                self.finished = true;
                Ok(value)
            }
            Err(err) => {
                self.rollback().await;
                Err(err)
            }
        }
    }

    async fn rollback(&mut self) {
        match sqlx::query("ROLLBACK").execute(&mut *self.conn).await {
            Ok(_) => self.finished = true,
            Err(e) => warn!(error = %e, "Rollback failed; connection will be discarded"),
        }
    }
}

impl Drop for WriteTx {
    fn drop(&mut self) {
        if !self.finished {
            self.conn.close_on_drop();
        }
    }
}
