//! UserRepository - Repository per la gestione degli utenti

use super::{Criteria, Order, PoolType, RepoError, Repository};
use crate::entities::{User, UserType};
use crate::utils::EnumStr;
use std::ops::Deref;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

/// Typed repository for [`User`]; the generic operations are reachable
/// through `Deref`
#[derive(Clone)]
pub struct UserRepository {
    inner: Repository<User>,
}

impl UserRepository {
    pub fn new(connection_pool: PoolType) -> UserRepository {
        Self {
            inner: Repository::new(connection_pool),
        }
    }

    /// Username is unique; soft-deleted users are never returned
    #[instrument(skip(self, cancel))]
    pub async fn find_by_username(
        &self,
        username: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<User>, RepoError> {
        self.inner
            .find(Criteria::eq("username", username), false, cancel)
            .await
    }

    /// Users whose username starts with `prefix`, ordered by username
    #[instrument(skip(self, cancel))]
    pub async fn search(
        &self,
        prefix: Option<&str>,
        include_deleted: bool,
        limit: i64,
        cancel: &CancellationToken,
    ) -> Result<Vec<User>, RepoError> {
        let mut query = self.inner.get_all(cancel)?;
        if let Some(prefix) = prefix.map(str::trim).filter(|p| !p.is_empty()) {
            query = query.filter(Criteria::starts_with("username", prefix));
        }
        if !include_deleted {
            query = query.exclude_deleted();
        }
        let users = query.order_by("username", Order::Asc).limit(limit).fetch_all().await?;
        debug!("Found {} users", users.len());
        Ok(users)
    }

    /// Whether at least one active administrator exists
    pub async fn has_active_admin(&self, cancel: &CancellationToken) -> Result<bool, RepoError> {
        self.inner
            .any(
                Criteria::eq("user_type", UserType::Admin.as_str()).and(Criteria::not_deleted()),
                cancel,
            )
            .await
    }

    /// Predicate matching soft-deleted users
    pub fn deactivated() -> Criteria {
        Criteria::eq("is_deleted", true)
    }
}

impl Deref for UserRepository {
    type Target = Repository<User>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
