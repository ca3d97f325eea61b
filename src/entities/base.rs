//! Base entity - Campi comuni a tutti i record persistiti

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// Soft-delete flag, audit timestamps and optimistic concurrency token.
///
/// Every table mapped through the generic repository carries these columns.
/// `row_version` is bumped by each successful update and checked by updates
/// and deletes, so a stale copy of a record can never overwrite a newer one.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct AuditFields {
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub row_version: i64,
}

impl AuditFields {
    /// Timestamps are kept at microsecond precision so they survive the
    /// round trip through the database unchanged
    pub fn now() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }
}

impl Default for AuditFields {
    fn default() -> Self {
        let now = Self::now();
        Self {
            is_deleted: false,
            created_at: now,
            modified_at: now,
            row_version: 0,
        }
    }
}
