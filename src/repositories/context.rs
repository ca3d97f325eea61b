//! DbContext - Contesto condiviso con il tracciamento delle modifiche
//!
//! Repositories never write to the database directly: they record what should
//! happen to an entity (added, modified, deleted) in the context's
//! [`ChangeTracker`], and the [`UnitOfWork`](super::UnitOfWork) flushes the
//! recorded changes in a single transaction.

use super::traits::{Entity, Persist, Scope};
use super::unit_of_work::UnitOfWork;
use super::{PoolType, RepoError, SqlValue};
use crate::entities::AuditFields;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityState {
    Added,
    Modified,
    Deleted,
}

/// Snapshot of a pending change, detached from the entity's concrete type
#[derive(Debug, Clone)]
pub struct TrackedChange {
    pub table: &'static str,
    pub key_column: &'static str,
    pub key: SqlValue,
    pub state: EntityState,
    pub columns: &'static [&'static str],
    pub values: Vec<SqlValue>,
    pub audit: AuditFields,
    /// `row_version` the database row must still have for the change to apply
    pub expected_version: i64,
}

impl TrackedChange {
    fn of<E: Entity>(entity: &E, state: EntityState, expected_version: i64) -> Self {
        Self {
            table: E::TABLE,
            key_column: E::KEY_COLUMN,
            key: entity.id().into(),
            state,
            columns: E::COLUMNS,
            values: entity.values(),
            audit: entity.audit().clone(),
            expected_version,
        }
    }
}

/// Ordered list of pending changes, at most one per (table, key)
#[derive(Debug, Default)]
pub struct ChangeTracker {
    entries: Vec<TrackedChange>,
}

impl ChangeTracker {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn state_of(&self, table: &str, key: &SqlValue) -> Option<EntityState> {
        self.position(table, key).map(|i| self.entries[i].state)
    }

    /// Removes the tracked instance for the given key, if any
    pub fn detach(&mut self, table: &str, key: &SqlValue) -> Option<TrackedChange> {
        self.position(table, key).map(|i| self.entries.remove(i))
    }

    pub fn track_added<E: Entity>(&mut self, entity: &E) {
        let key = entity.id().into();
        if self.detach(E::TABLE, &key).is_some() {
            debug!("Replacing tracked instance of {} {}", E::TABLE, key);
        }
        self.entries
            .push(TrackedChange::of(entity, EntityState::Added, entity.audit().row_version));
    }

    /// Detaches any previously tracked instance and tracks the new one as
    /// modified. An instance still pending insertion stays `Added` and just
    /// takes the new values.
    pub fn track_modified<E: Entity>(&mut self, entity: &E, expected_version: i64) {
        let key = entity.id().into();
        if let Some(i) = self.position(E::TABLE, &key) {
            if self.entries[i].state == EntityState::Added {
                self.entries[i] =
                    TrackedChange::of(entity, EntityState::Added, entity.audit().row_version);
                return;
            }
            self.entries.remove(i);
        }
        self.entries
            .push(TrackedChange::of(entity, EntityState::Modified, expected_version));
    }

    /// Tracks the entity for a hard delete. An instance that was only pending
    /// insertion is simply forgotten.
    pub fn track_deleted<E: Entity>(&mut self, entity: &E) {
        let key = entity.id().into();
        if let Some(previous) = self.detach(E::TABLE, &key) {
            if previous.state == EntityState::Added {
                return;
            }
        }
        self.entries.push(TrackedChange::of(
            entity,
            EntityState::Deleted,
            entity.audit().row_version,
        ));
    }

    pub fn drain(&mut self) -> Vec<TrackedChange> {
        std::mem::take(&mut self.entries)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn position(&self, table: &str, key: &SqlValue) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.table == table && &entry.key == key)
    }
}

/// Shared context: connection pool, pending changes and the cancellation
/// signal used when flushing
pub struct DbContext {
    connection_pool: PoolType,
    tracker: ChangeTracker,
    cancel: CancellationToken,
}

impl DbContext {
    pub fn new(connection_pool: PoolType) -> Self {
        Self::with_cancellation(connection_pool, CancellationToken::new())
    }

    pub fn with_cancellation(connection_pool: PoolType, cancel: CancellationToken) -> Self {
        Self {
            connection_pool,
            tracker: ChangeTracker::default(),
            cancel,
        }
    }

    pub fn pool(&self) -> &PoolType {
        &self.connection_pool
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn tracker(&self) -> &ChangeTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut ChangeTracker {
        &mut self.tracker
    }

    pub fn has_changes(&self) -> bool {
        !self.tracker.is_empty()
    }

    /// Opens a batch: mutations made through it are only tracked until
    /// [`Batch::commit`] flushes them together
    pub fn begin_batch(&mut self) -> Batch<'_> {
        Batch {
            ctx: self,
            committed: false,
        }
    }
}

impl Scope for DbContext {
    fn context(&mut self) -> &mut DbContext {
        self
    }

    fn persist(&self) -> Persist {
        Persist::Immediate
    }
}

/// Deferred-persistence scope over a [`DbContext`]
///
/// Dropping a batch without committing it discards its pending changes.
pub struct Batch<'a> {
    ctx: &'a mut DbContext,
    committed: bool,
}

impl Batch<'_> {
    pub fn pending(&self) -> usize {
        self.ctx.tracker.len()
    }

    /// Flushes every change tracked through the batch in one transaction
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of rows written
    /// * `Err(RepoError)` - Cancellation or persistence error, nothing written
    pub async fn commit(mut self, cancel: &CancellationToken) -> Result<usize, RepoError> {
        let result = UnitOfWork::commit(&mut *self.ctx, cancel).await;
        // a failed commit leaves nothing pending behind
        self.committed = result.is_ok();
        result
    }
}

impl Scope for Batch<'_> {
    fn context(&mut self) -> &mut DbContext {
        &mut *self.ctx
    }

    fn persist(&self) -> Persist {
        Persist::Deferred
    }
}

impl Drop for Batch<'_> {
    fn drop(&mut self) {
        if !self.committed && !self.ctx.tracker.is_empty() {
            warn!(
                "Discarding {} uncommitted change(s) from dropped batch",
                self.ctx.tracker.len()
            );
            self.ctx.tracker.clear();
        }
    }
}
