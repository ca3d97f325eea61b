//! User DTOs - Data Transfer Objects per utenti

use crate::entities::{User, UserType};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

lazy_static! {
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_.\-]+$").unwrap();
}

// struct per gestire io col client, l'hash della password non esce mai
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserDTO {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub user_type: UserType,
    pub password_changed_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub row_version: i64,
}

impl From<User> for UserDTO {
    fn from(value: User) -> Self {
        Self {
            id: value.id,
            username: value.username,
            full_name: value.full_name,
            user_type: value.user_type,
            password_changed_at: value.password_changed_at,
            is_deleted: value.audit.is_deleted,
            created_at: value.audit.created_at,
            modified_at: value.audit.modified_at,
            row_version: value.audit.row_version,
        }
    }
}

/// DTO per creare un nuovo utente (senza id)
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct CreateUserDTO {
    #[validate(
        length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"),
        regex(path = *USERNAME_RE, message = "Username may only contain letters, digits, '_', '.' and '-'")
    )]
    pub username: String,

    #[validate(length(min = 1, max = 200, message = "Full name must be between 1 and 200 characters"))]
    pub full_name: String,

    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub password: String,

    pub user_type: UserType,
}

/// DTO per aggiornare un utente: sostituisce tutti i campi modificabili
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct UpdateUserDTO {
    #[validate(
        length(min = 3, max = 50, message = "Username must be between 3 and 50 characters"),
        regex(path = *USERNAME_RE, message = "Username may only contain letters, digits, '_', '.' and '-'")
    )]
    pub username: String,

    #[validate(length(min = 1, max = 200, message = "Full name must be between 1 and 200 characters"))]
    pub full_name: String,

    pub user_type: UserType,

    /// Version the client read; a stale value makes the update fail with 409
    pub row_version: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(username: &str) -> CreateUserDTO {
        CreateUserDTO {
            username: username.to_string(),
            full_name: "Mario Rossi".to_string(),
            password: "Password123".to_string(),
            user_type: UserType::Viewer,
        }
    }

    #[test]
    fn test_username_validation() {
        assert!(create("mario.rossi-01").validate().is_ok());
        assert!(create("mr").validate().is_err());
        assert!(create("mario rossi").validate().is_err());
        assert!(create(&"a".repeat(51)).validate().is_err());
    }

    #[test]
    fn test_dto_never_carries_the_hash() {
        let user = User::new("mrossi", "Mario Rossi", "secret-hash".to_string(), UserType::Admin);
        let json = serde_json::to_string(&UserDTO::from(user)).unwrap();
        assert!(!json.contains("secret-hash"));
        assert!(json.contains("\"user_type\":\"ADMIN\""));
    }
}
