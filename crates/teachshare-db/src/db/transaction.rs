//! Database transaction utilities
//!
//! Multi-statement writes (a document together with its rating aggregate) go
//! through [`TransactionGuard`] so they land atomically.

use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use teachshare_core::AppError;

/// A transaction that is committed with [`commit`](Self::commit) and rolled
/// back when dropped uncommitted, e.g. when a statement fails and `?` returns.
///
/// ```ignore
/// let mut tx = TransactionGuard::begin(&pool).await?;
/// sqlx::query("INSERT INTO ...").execute(tx.conn()?).await?;
/// tx.commit().await?;
/// ```
pub struct TransactionGuard<'a> {
    transaction: Option<Transaction<'a, Postgres>>,
}

impl<'a> TransactionGuard<'a> {
    pub async fn begin(pool: &'a PgPool) -> Result<Self, AppError> {
        let transaction = pool.begin().await?;
        Ok(Self {
            transaction: Some(transaction),
        })
    }

    /// Connection to run statements on inside the transaction.
    pub fn conn(&mut self) -> Result<&mut PgConnection, AppError> {
        self.transaction.as_deref_mut().ok_or_else(|| {
            AppError::Internal("Transaction was already committed".to_string())
        })
    }

    pub async fn commit(mut self) -> Result<(), AppError> {
        if let Some(tx) = self.transaction.take() {
            tx.commit().await?;
        }
        Ok(())
    }

}

impl Drop for TransactionGuard<'_> {
    fn drop(&mut self) {
        // sqlx queues the rollback itself when the inner transaction drops.
        if self.transaction.is_some() {
            tracing::warn!("Transaction dropped without commit, rolling back");
        }
    }
}
