//! SystemConfigurationRepository - Accesso alla configurazione di sistema

use super::{Criteria, Order, PoolType, RepoError, Repository, Scope};
use crate::entities::{ConfigKey, SystemConfiguration};
use crate::utils::EnumStr;
use std::ops::Deref;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use validator::Validate;

#[derive(Clone)]
pub struct SystemConfigurationRepository {
    inner: Repository<SystemConfiguration>,
}

impl SystemConfigurationRepository {
    pub fn new(connection_pool: PoolType) -> Self {
        Self {
            inner: Repository::new(connection_pool),
        }
    }

    fn by_key(key: ConfigKey) -> Criteria {
        Criteria::eq("config_key", key.as_str())
    }

    #[instrument(skip(self, cancel), fields(key = %key))]
    pub async fn get_by_key(
        &self,
        key: ConfigKey,
        cancel: &CancellationToken,
    ) -> Result<Option<SystemConfiguration>, RepoError> {
        self.inner.find(Self::by_key(key), false, cancel).await
    }

    /// Every active configuration, ordered by key
    pub async fn list(&self, cancel: &CancellationToken) -> Result<Vec<SystemConfiguration>, RepoError> {
        self.inner
            .get_all(cancel)?
            .exclude_deleted()
            .order_by("config_key", Order::Asc)
            .fetch_all()
            .await
    }

    /// Inserts the configuration or overwrites the one stored under the same key
    #[instrument(skip(self, scope, config), fields(key = %config.key()))]
    pub async fn upsert<S: Scope>(
        &self,
        scope: &mut S,
        config: SystemConfiguration,
    ) -> Result<SystemConfiguration, RepoError> {
        config.validate()?;
        config.check_value().map_err(RepoError::Validation)?;
        debug!("Upserting configuration");
        self.inner
            .add_or_update_by(scope, config, |c| Self::by_key(c.key()))
            .await
    }

    /// Time span configured under `key`, `None` when the key is missing or
    /// its unit is not a time unit
    pub async fn duration(
        &self,
        key: ConfigKey,
        cancel: &CancellationToken,
    ) -> Result<Option<chrono::Duration>, RepoError> {
        Ok(self
            .get_by_key(key, cancel)
            .await?
            .and_then(|config| config.duration()))
    }
}

impl Deref for SystemConfigurationRepository {
    type Target = Repository<SystemConfiguration>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
