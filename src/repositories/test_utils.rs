//! Test utilities - Pool in memoria ed entità di prova per i test del repository

use super::traits::Entity;
use super::{PoolType, SqlValue};
use crate::entities::AuditFields;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

/// Minimal entity with an integer key, used to exercise the generic repository
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub body: Option<String>,
    #[sqlx(flatten)]
    pub audit: AuditFields,
}

impl Note {
    pub fn new(id: i64, title: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            body: Some(format!("body of {title}")),
            audit: AuditFields::default(),
        }
    }
}

impl Entity for Note {
    type Id = i64;

    const TABLE: &'static str = "notes";
    const KEY_COLUMN: &'static str = "id";
    const COLUMNS: &'static [&'static str] = &["title", "body"];

    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }

    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![self.title.clone().into(), self.body.clone().into()]
    }
}

/// Single-connection in-memory database with the migrations applied plus the
/// `notes` test tables
pub async fn memory_pool() -> PoolType {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid sqlite url")
        .foreign_keys(true);

    // one connection that never expires, otherwise the in-memory db vanishes
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("in-memory pool");

    sqlx::migrate!().run(&pool).await.expect("migrations");

    sqlx::query(
        r#"
        CREATE TABLE notes (
            id INTEGER PRIMARY KEY NOT NULL,
            title TEXT NOT NULL,
            body TEXT,
            is_deleted BOOLEAN NOT NULL DEFAULT FALSE,
            created_at TEXT NOT NULL,
            modified_at TEXT NOT NULL,
            row_version INTEGER NOT NULL DEFAULT 1
        );
        CREATE TABLE note_refs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            note_id INTEGER NOT NULL REFERENCES notes (id)
        );
        "#,
    )
    .execute(&pool)
    .await
    .expect("test tables");

    pool
}
