//! SqlValue - Valori dinamici da bindare nelle query generate
//!
//! The generic repository builds its statements at runtime, so column values
//! travel as `SqlValue` and are bound through `sqlx::QueryBuilder`.

use super::DbKind;
use chrono::{DateTime, Utc};
use sqlx::QueryBuilder;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    /// Appends a `?` placeholder to the builder and binds the value to it
    pub fn push_bind(&self, builder: &mut QueryBuilder<'static, DbKind>) {
        match self {
            SqlValue::Null => builder.push_bind(None::<String>),
            SqlValue::Bool(v) => builder.push_bind(*v),
            SqlValue::Int(v) => builder.push_bind(*v),
            SqlValue::Real(v) => builder.push_bind(*v),
            SqlValue::Text(v) => builder.push_bind(v.clone()),
            SqlValue::Uuid(v) => builder.push_bind(*v),
            SqlValue::Timestamp(v) => builder.push_bind(*v),
        };
    }
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Bool(v) => write!(f, "{v}"),
            SqlValue::Int(v) => write!(f, "{v}"),
            SqlValue::Real(v) => write!(f, "{v}"),
            SqlValue::Text(v) => write!(f, "{v}"),
            SqlValue::Uuid(v) => write!(f, "{v}"),
            SqlValue::Timestamp(v) => write!(f, "{}", v.to_rfc3339()),
        }
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(i64::from(value))
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Real(value)
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<Uuid> for SqlValue {
    fn from(value: Uuid) -> Self {
        SqlValue::Uuid(value)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}
