//! Common repository traits
//!
//! `Entity` is the contract a record type implements to be handled by the
//! generic [`Repository`](super::Repository); `Scope` is the handle mutating
//! calls receive, deciding whether changes are flushed immediately or batched.

use super::{DbContext, DbRow, SqlValue};
use crate::entities::AuditFields;
use std::fmt::Display;

/// Trait for records persisted through the generic repository
///
/// # Type Parameters
/// * `Id` - Type of the primary key (e.g. `i64`, `Uuid`)
pub trait Entity: for<'r> sqlx::FromRow<'r, DbRow> + Clone + Send + Sync + Unpin + 'static {
    type Id: Clone + Display + Into<SqlValue> + Send + Sync;

    /// Table name
    const TABLE: &'static str;

    /// Primary key column
    const KEY_COLUMN: &'static str;

    /// Mapped columns other than the primary key and the audit columns,
    /// in the same order [`Entity::values`] returns them
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> Self::Id;

    fn set_id(&mut self, id: Self::Id);

    fn audit(&self) -> &AuditFields;

    fn audit_mut(&mut self) -> &mut AuditFields;

    /// Values for [`Entity::COLUMNS`]
    fn values(&self) -> Vec<SqlValue>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persist {
    /// Every mutation is flushed through the unit of work right away
    Immediate,
    /// Mutations are only tracked until the scope is committed
    Deferred,
}

/// Handle passed by `&mut` to every mutating repository call
pub trait Scope: Send {
    fn context(&mut self) -> &mut DbContext;

    fn persist(&self) -> Persist;
}
