//! Request-scoped unit of work.

use std::sync::Arc;

use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, TransactionTrait};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};

use crate::error::{RepoError, RepoResult};

/// One session per request.
///
/// The first operation begins a transaction that stays open until
/// [`commit`](Self::commit), [`rollback`](Self::rollback) or
/// [`close`](Self::close). Dropping an open session rolls it back.
#[derive(Debug)]
pub struct DbSession {
    conn: Arc<DatabaseConnection>,
    tx: Mutex<Option<DatabaseTransaction>>,
}

impl DbSession {
    pub fn new(conn: Arc<DatabaseConnection>) -> Self {
        Self {
            conn,
            tx: Mutex::new(None),
        }
    }

    /// Underlying connection; statements issued on it bypass the session transaction.
    pub fn connection(&self) -> &DatabaseConnection {
        self.conn.as_ref()
    }

    /// Whether a transaction is currently open.
    pub async fn in_transaction(&self) -> bool {
        self.tx.lock().await.is_some()
    }

    /// Borrow the open transaction, beginning one if needed.
    ///
    /// The guard serializes access; drop it before calling `commit`/`rollback`.
    pub async fn tx(&self) -> Result<MappedMutexGuard<'_, DatabaseTransaction>, DbErr> {
        let mut slot = self.tx.lock().await;
        if slot.is_none() {
            tracing::trace!("begin transaction");
            *slot = Some(self.conn.begin().await?);
        }
        MutexGuard::try_map(slot, |tx| tx.as_mut())
            .map_err(|_| DbErr::Custom("session transaction is not available".into()))
    }

    pub async fn commit(&self) -> Result<(), DbErr> {
        let tx = self.tx.lock().await.take();
        if let Some(tx) = tx {
            tracing::trace!("commit transaction");
            tx.commit().await?;
        }
        Ok(())
    }

    pub async fn rollback(&self) -> Result<(), DbErr> {
        let tx = self.tx.lock().await.take();
        if let Some(tx) = tx {
            tracing::debug!("rollback transaction");
            tx.rollback().await?;
        }
        Ok(())
    }

    /// End the session, discarding anything not committed.
    pub async fn close(self) -> Result<(), DbErr> {
        self.rollback().await
    }

    /// Finalize an operation: commit on success when asked, roll back on failure.
    pub(crate) async fn finish<T>(&self, result: RepoResult<T>, commit: bool) -> RepoResult<T> {
        match result {
            Ok(value) => {
                if commit {
                    self.commit().await.map_err(RepoError::from)?;
                }
                Ok(value)
            }
            Err(err) => {
                if let Err(rb) = self.rollback().await {
                    tracing::warn!(error = %rb, "rollback failed after error: {err}");
                }
                Err(err)
            }
        }
    }
}
