//! UnitOfWork - Unico punto di commit delle modifiche tracciate

use super::context::{EntityState, TrackedChange};
use super::{DbContext, DbKind, RepoError};
use sqlx::{QueryBuilder, Transaction};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

pub struct UnitOfWork;

impl UnitOfWork {
    /// Flushes every pending change of the context in one transaction
    ///
    /// The pending changes are taken out of the context whatever the outcome:
    /// on failure the transaction is rolled back and nothing is written.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of rows written
    /// * `Err(RepoError::Cancelled)` - Signal already triggered, nothing touched
    /// * `Err(RepoError::ConcurrencyConflict)` - A guarded row changed meanwhile
    /// * `Err(RepoError::Database)` - Any other persistence error, unchanged
    #[instrument(skip_all, fields(pending = ctx.tracker().len()))]
    pub async fn commit(ctx: &mut DbContext, cancel: &CancellationToken) -> Result<usize, RepoError> {
        if cancel.is_cancelled() {
            warn!("Commit requested on a cancelled scope");
            return Err(RepoError::Cancelled);
        }

        let changes = ctx.tracker_mut().drain();
        if changes.is_empty() {
            debug!("Nothing to commit");
            return Ok(0);
        }

        let mut tx = ctx.pool().begin().await?;
        match Self::apply(&mut tx, &changes).await {
            Ok(written) => {
                tx.commit().await?;
                info!("Committed {} change(s)", written);
                Ok(written)
            }
            Err(err) => {
                error!("Commit failed, rolling back: {}", err);
                tx.rollback().await?;
                Err(err)
            }
        }
    }

    /// Applies the changes in order inside an already open transaction
    pub async fn apply(
        tx: &mut Transaction<'static, DbKind>,
        changes: &[TrackedChange],
    ) -> Result<usize, RepoError> {
        let mut written = 0;
        for change in changes {
            let mut builder = Self::statement(change);
            let result = builder.build().execute(&mut **tx).await?;

            if result.rows_affected() == 0 {
                warn!(
                    "No row matched {:?} on {} {} at version {}",
                    change.state, change.table, change.key, change.expected_version
                );
                return Err(RepoError::ConcurrencyConflict {
                    table: change.table,
                    key: change.key.to_string(),
                });
            }
            written += 1;
        }
        Ok(written)
    }

    fn statement(change: &TrackedChange) -> QueryBuilder<'static, DbKind> {
        match change.state {
            EntityState::Added => {
                let mut builder = QueryBuilder::new(format!("INSERT INTO {} (", change.table));
                builder.push(change.key_column);
                for column in change.columns {
                    builder.push(", ").push(*column);
                }
                builder.push(", is_deleted, created_at, modified_at, row_version) VALUES (");
                change.key.push_bind(&mut builder);
                for value in &change.values {
                    builder.push(", ");
                    value.push_bind(&mut builder);
                }
                builder.push(", ");
                builder.push_bind(change.audit.is_deleted);
                builder.push(", ");
                builder.push_bind(change.audit.created_at);
                builder.push(", ");
                builder.push_bind(change.audit.modified_at);
                builder.push(", ");
                builder.push_bind(change.audit.row_version);
                builder.push(")");
                builder
            }
            EntityState::Modified => {
                let mut builder = QueryBuilder::new(format!("UPDATE {} SET ", change.table));
                for (column, value) in change.columns.iter().zip(&change.values) {
                    builder.push(*column).push(" = ");
                    value.push_bind(&mut builder);
                    builder.push(", ");
                }
                builder.push("is_deleted = ");
                builder.push_bind(change.audit.is_deleted);
                builder.push(", modified_at = ");
                builder.push_bind(change.audit.modified_at);
                builder.push(", row_version = ");
                builder.push_bind(change.audit.row_version);
                Self::push_guard(&mut builder, change);
                builder
            }
            EntityState::Deleted => {
                let mut builder = QueryBuilder::new(format!("DELETE FROM {}", change.table));
                Self::push_guard(&mut builder, change);
                builder
            }
        }
    }

    fn push_guard(builder: &mut QueryBuilder<'static, DbKind>, change: &TrackedChange) {
        builder.push(" WHERE ").push(change.key_column).push(" = ");
        change.key.push_bind(builder);
        builder.push(" AND row_version = ");
        builder.push_bind(change.expected_version);
    }
}
