//! Repository generico - Facciata di accesso ai dati per qualsiasi entità
//!
//! Reads go straight to the pool and are never tracked. Mutations only record
//! the change in the scope's tracker and then flush it through the unit of
//! work, unless the scope is a [`Batch`](super::Batch) that defers the flush.

use super::context::ChangeTracker;
use super::traits::{Entity, Persist, Scope};
use super::unit_of_work::UnitOfWork;
use super::{Criteria, PoolType, Query, RepoError};
use crate::entities::AuditFields;
use std::marker::PhantomData;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

pub struct Repository<E: Entity> {
    connection_pool: PoolType,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self::new(self.connection_pool.clone())
    }
}

impl<E: Entity> Repository<E> {
    pub fn new(connection_pool: PoolType) -> Self {
        Self {
            connection_pool,
            _entity: PhantomData,
        }
    }

    /// Every row, soft-deleted ones included, as a composable query
    pub fn get_all(&self, cancel: &CancellationToken) -> Result<Query<E>, RepoError> {
        ensure_not_cancelled(cancel)?;
        Ok(Query::new(self.connection_pool.clone(), cancel.clone()))
    }

    /// Rows matching an arbitrary predicate, as a composable query
    pub fn filter(&self, criteria: Criteria, cancel: &CancellationToken) -> Result<Query<E>, RepoError> {
        Ok(self.get_all(cancel)?.filter(criteria))
    }

    /// Reads an entity by primary key
    ///
    /// # Returns
    /// * `Ok(Some(E))` - Entity found
    /// * `Ok(None)` - No row with that key, or the row is soft-deleted and
    ///   `include_deleted` is false
    #[instrument(skip(self, cancel), fields(table = E::TABLE, id = %id))]
    pub async fn get(
        &self,
        id: &E::Id,
        include_deleted: bool,
        cancel: &CancellationToken,
    ) -> Result<Option<E>, RepoError> {
        debug!("Reading by id");
        self.find(Criteria::eq(E::KEY_COLUMN, id.clone()), include_deleted, cancel)
            .await
    }

    /// First entity matching the predicate, honouring `include_deleted` the
    /// same way [`Repository::get`] does
    pub async fn find(
        &self,
        criteria: Criteria,
        include_deleted: bool,
        cancel: &CancellationToken,
    ) -> Result<Option<E>, RepoError> {
        let mut query = self.filter(criteria, cancel)?;
        if !include_deleted {
            query = query.exclude_deleted();
        }
        query.first().await
    }

    /// Whether any row, soft-deleted ones included, matches the predicate
    pub async fn any(&self, criteria: Criteria, cancel: &CancellationToken) -> Result<bool, RepoError> {
        self.filter(criteria, cancel)?.exists().await
    }

    /// Stamps the audit fields, tracks the entity as added and flushes it
    /// unless the scope defers persistence
    #[instrument(skip(self, scope, entity), fields(table = E::TABLE, id = %entity.id()))]
    pub async fn insert<S: Scope>(&self, scope: &mut S, mut entity: E) -> Result<E, RepoError> {
        let now = AuditFields::now();
        let audit = entity.audit_mut();
        audit.created_at = now;
        audit.modified_at = now;
        audit.row_version = 1;

        scope.context().tracker_mut().track_added(&entity);
        debug!("Entity tracked as added");
        Self::flush(scope).await?;
        Ok(entity)
    }

    /// Replaces every mapped column of the stored row with the entity's values
    ///
    /// Any other tracked instance with the same key is detached first. The
    /// write only applies if the row still carries the entity's `row_version`,
    /// otherwise the flush fails with [`RepoError::ConcurrencyConflict`].
    #[instrument(skip(self, scope, entity), fields(table = E::TABLE, id = %entity.id()))]
    pub async fn update<S: Scope>(&self, scope: &mut S, mut entity: E) -> Result<E, RepoError> {
        let expected_version = entity.audit().row_version;
        // no stored row can carry the last representable version
        let next_version = expected_version.checked_add(1).ok_or_else(|| {
            warn!("Row version {} cannot be incremented", expected_version);
            RepoError::ConcurrencyConflict {
                table: E::TABLE,
                key: entity.id().to_string(),
            }
        })?;
        let audit = entity.audit_mut();
        audit.row_version = next_version;
        audit.modified_at = AuditFields::now();

        scope
            .context()
            .tracker_mut()
            .track_modified(&entity, expected_version);
        debug!("Entity tracked as modified (expected version {})", expected_version);
        Self::flush(scope).await?;
        Ok(entity)
    }

    /// Hard delete. Soft deletion is done by setting the flag and calling
    /// [`Repository::update`].
    #[instrument(skip(self, scope, entity), fields(table = E::TABLE, id = %entity.id()))]
    pub async fn delete<S: Scope>(&self, scope: &mut S, entity: E) -> Result<E, RepoError> {
        scope.context().tracker_mut().track_deleted(&entity);
        debug!("Entity tracked as deleted");
        Self::flush(scope).await?;
        Ok(entity)
    }

    /// Deletes every row matching the predicate inside one explicit
    /// transaction and returns the deleted entities
    ///
    /// Changes already pending in the scope are left untouched. On failure
    /// the transaction is rolled back: a concurrency conflict is returned as
    /// is, anything else is wrapped in [`RepoError::UpdateFailed`].
    #[instrument(skip(self, scope, criteria, cancel), fields(table = E::TABLE))]
    pub async fn delete_many<S: Scope>(
        &self,
        scope: &mut S,
        criteria: Criteria,
        cancel: &CancellationToken,
    ) -> Result<Vec<E>, RepoError> {
        let query = self.filter(criteria, cancel)?;
        let mut tx = scope.context().pool().begin().await?;

        let outcome: Result<Vec<E>, RepoError> = async {
            let mut builder = query.select_sql();
            let matches = builder.build_query_as::<E>().fetch_all(&mut *tx).await?;

            let mut pending = ChangeTracker::default();
            for entity in &matches {
                pending.track_deleted(entity);
            }
            UnitOfWork::apply(&mut tx, &pending.drain()).await?;
            Ok(matches)
        }
        .await;

        match outcome {
            Ok(matches) => match tx.commit().await {
                Ok(()) => {
                    info!("Deleted {} row(s)", matches.len());
                    Ok(matches)
                }
                Err(err) => Err(RepoError::UpdateFailed {
                    table: E::TABLE,
                    source: Box::new(err.into()),
                }),
            },
            Err(err) if err.is_concurrency_conflict() => {
                warn!("Concurrency conflict while deleting, rolling back");
                tx.rollback().await?;
                Err(err)
            }
            Err(err) => {
                error!("Delete failed, rolling back: {}", err);
                tx.rollback().await?;
                Err(RepoError::UpdateFailed {
                    table: E::TABLE,
                    source: Box::new(err),
                })
            }
        }
    }

    /// Inserts the entity, or overwrites the stored row with the same key
    pub async fn add_or_update<S: Scope>(&self, scope: &mut S, entity: E) -> Result<E, RepoError> {
        let key = Criteria::eq(E::KEY_COLUMN, entity.id());
        self.add_or_update_by(scope, entity, move |_| key.clone()).await
    }

    /// Like [`Repository::add_or_update`], matching the stored row through a
    /// caller supplied alternate key. The stored row's id, creation time and
    /// `row_version` are carried over to the entity before it is updated.
    #[instrument(skip_all, fields(table = E::TABLE))]
    pub async fn add_or_update_by<S, F>(
        &self,
        scope: &mut S,
        mut entity: E,
        key_selector: F,
    ) -> Result<E, RepoError>
    where
        S: Scope,
        F: Fn(&E) -> Criteria,
    {
        let criteria = key_selector(&entity);
        let cancel = scope.context().cancellation().clone();

        match self.find(criteria, true, &cancel).await? {
            Some(current) => {
                debug!("Existing row found, updating");
                entity.set_id(current.id());
                let audit = entity.audit_mut();
                audit.created_at = current.audit().created_at;
                audit.row_version = current.audit().row_version;
                self.update(scope, entity).await
            }
            None => {
                debug!("No existing row, inserting");
                self.insert(scope, entity).await
            }
        }
    }

    /// Flushes the scope's pending changes; a no-op for a deferred batch,
    /// which is flushed by its own commit
    pub async fn save<S: Scope>(&self, scope: &mut S, cancel: &CancellationToken) -> Result<(), RepoError> {
        if scope.persist() == Persist::Immediate {
            UnitOfWork::commit(scope.context(), cancel).await?;
        }
        Ok(())
    }

    async fn flush<S: Scope>(scope: &mut S) -> Result<(), RepoError> {
        if scope.persist() == Persist::Deferred {
            return Ok(());
        }
        let cancel = scope.context().cancellation().clone();
        UnitOfWork::commit(scope.context(), &cancel).await?;
        Ok(())
    }
}

fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<(), RepoError> {
    if cancel.is_cancelled() {
        return Err(RepoError::Cancelled);
    }
    Ok(())
}
