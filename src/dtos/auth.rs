//! Auth DTOs - Richieste e risposte di login e cambio password

use serde::{Deserialize, Serialize};
use validator::Validate;

/// DTO per il login (solo username e password)
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginDTO {
    pub username: String,
    pub password: String,
}

/// Token emesso al login
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TokenDTO {
    pub token: String,
    pub token_type: String,
    /// Seconds until the token expires
    pub expires_in: i64,
    pub password_expired: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct ChangePasswordDTO {
    pub current_password: String,

    #[validate(length(min = 8, max = 128, message = "Password must be between 8 and 128 characters"))]
    pub new_password: String,
}
