//! Query - Interrogazione lazy e componibile su una tabella
//!
//! Nothing touches the database until one of the terminal methods
//! (`fetch_all`, `first`, `count`, `exists`) is awaited.

use super::traits::Entity;
use super::{Criteria, DbKind, PoolType, RepoError};
use sqlx::QueryBuilder;
use std::marker::PhantomData;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

pub struct Query<E: Entity> {
    connection_pool: PoolType,
    criteria: Criteria,
    order: Vec<(&'static str, Order)>,
    limit: Option<i64>,
    offset: Option<i64>,
    cancel: CancellationToken,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Query<E> {
    pub(crate) fn new(connection_pool: PoolType, cancel: CancellationToken) -> Self {
        Self {
            connection_pool,
            criteria: Criteria::All,
            order: Vec::new(),
            limit: None,
            offset: None,
            cancel,
            _entity: PhantomData,
        }
    }

    /// Narrows the query; successive filters are combined with `AND`
    pub fn filter(mut self, criteria: Criteria) -> Self {
        self.criteria = self.criteria.and(criteria);
        self
    }

    pub fn exclude_deleted(self) -> Self {
        self.filter(Criteria::not_deleted())
    }

    pub fn order_by(mut self, column: &'static str, order: Order) -> Self {
        self.order.push((column, order));
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    pub async fn fetch_all(self) -> Result<Vec<E>, RepoError> {
        self.ensure_not_cancelled()?;
        let mut builder = self.select_sql();
        let rows = builder
            .build_query_as::<E>()
            .fetch_all(&self.connection_pool)
            .await?;
        debug!("Fetched {} row(s) from {}", rows.len(), E::TABLE);
        Ok(rows)
    }

    pub async fn first(self) -> Result<Option<E>, RepoError> {
        let query = self.limit(1);
        query.ensure_not_cancelled()?;
        let mut builder = query.select_sql();
        let row = builder
            .build_query_as::<E>()
            .fetch_optional(&query.connection_pool)
            .await?;
        Ok(row)
    }

    pub async fn count(self) -> Result<i64, RepoError> {
        self.ensure_not_cancelled()?;
        let mut builder = QueryBuilder::new(format!("SELECT COUNT(*) FROM {} WHERE ", E::TABLE));
        self.criteria.push_sql(&mut builder);
        let count: i64 = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.connection_pool)
            .await?;
        Ok(count)
    }

    pub async fn exists(self) -> Result<bool, RepoError> {
        self.ensure_not_cancelled()?;
        let mut builder =
            QueryBuilder::new(format!("SELECT EXISTS (SELECT 1 FROM {} WHERE ", E::TABLE));
        self.criteria.push_sql(&mut builder);
        builder.push(")");
        let found: i64 = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.connection_pool)
            .await?;
        Ok(found != 0)
    }

    /// `SELECT *` statement for the current filters, ordering and paging
    pub(crate) fn select_sql(&self) -> QueryBuilder<'static, DbKind> {
        let mut builder = QueryBuilder::new(format!("SELECT * FROM {} WHERE ", E::TABLE));
        self.criteria.push_sql(&mut builder);

        for (i, (column, order)) in self.order.iter().enumerate() {
            builder.push(if i == 0 { " ORDER BY " } else { ", " });
            builder.push(*column);
            builder.push(match order {
                Order::Asc => " ASC",
                Order::Desc => " DESC",
            });
        }

        // SQLite wants a LIMIT whenever OFFSET is present
        match (self.limit, self.offset) {
            (Some(limit), offset) => {
                builder.push(" LIMIT ").push_bind(limit);
                if let Some(offset) = offset {
                    builder.push(" OFFSET ").push_bind(offset);
                }
            }
            (None, Some(offset)) => {
                builder.push(" LIMIT -1 OFFSET ").push_bind(offset);
            }
            (None, None) => {}
        }

        builder
    }

    fn ensure_not_cancelled(&self) -> Result<(), RepoError> {
        if self.cancel.is_cancelled() {
            return Err(RepoError::Cancelled);
        }
        Ok(())
    }
}
