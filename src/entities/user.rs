//! User entity - Entità utente con metodi per gestione password

use super::{AuditFields, UserType};
use crate::repositories::{Entity, SqlValue};
use crate::utils::EnumStr;
use bcrypt::{hash, verify};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub password_hash: String,
    pub user_type: UserType,
    pub password_changed_at: DateTime<Utc>,
    /// `jti` of the only token currently accepted for this user
    pub active_token_id: Option<String>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub audit: AuditFields,
}

impl User {
    /// New user with a freshly generated id; `password_hash` must already be hashed
    pub fn new(username: &str, full_name: &str, password_hash: String, user_type: UserType) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.to_string(),
            full_name: full_name.to_string(),
            password_hash,
            user_type,
            password_changed_at: AuditFields::now(),
            active_token_id: None,
            audit: AuditFields::default(),
        }
    }

    /// Verify if target_password matches the stored hashed password
    pub fn verify_password(&self, target_password: &str) -> bool {
        verify(target_password, &self.password_hash).unwrap_or(false)
    }

    /// Hash a password using bcrypt, `bcrypt::DEFAULT_COST` outside of tests
    pub fn hash_password(password: &str, cost: u32) -> Result<String, bcrypt::BcryptError> {
        let hash = hash(password, cost)?;
        Ok(hash)
    }

    /// Replaces the password hash and restarts the expiry window
    pub fn set_password_hash(&mut self, password_hash: String) {
        self.password_hash = password_hash;
        self.password_changed_at = AuditFields::now();
    }

    /// Whether the password is older than `max_age`; no limit means it never expires
    pub fn is_password_expired(&self, max_age: Option<Duration>) -> bool {
        match max_age {
            // a deadline past the calendar range never comes
            Some(max_age) => self
                .password_changed_at
                .checked_add_signed(max_age)
                .is_some_and(|deadline| deadline <= Utc::now()),
            None => false,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.user_type == UserType::Admin
    }
}

impl Entity for User {
    type Id = Uuid;

    const TABLE: &'static str = "users";
    const KEY_COLUMN: &'static str = "id";
    const COLUMNS: &'static [&'static str] = &[
        "username",
        "full_name",
        "password_hash",
        "user_type",
        "password_changed_at",
        "active_token_id",
    ];

    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }

    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }

    fn values(&self) -> Vec<SqlValue> {
        vec![
            self.username.clone().into(),
            self.full_name.clone().into(),
            self.password_hash.clone().into(),
            self.user_type.as_str().into(),
            self.password_changed_at.into(),
            self.active_token_id.clone().into(),
        ]
    }
}
