//! Query DTOs - Data Transfer Objects per query di ricerca

use serde::{Deserialize, Serialize};

/// DTO per query parameters di ricerca utenti (`/users?search=al&include_deleted=true`)
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct UserSearchQuery {
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub include_deleted: bool,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// `?include_deleted=true` per includere gli elementi disattivati
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct VisibilityQuery {
    #[serde(default)]
    pub include_deleted: bool,
}
