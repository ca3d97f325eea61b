//! Services module - Coordinatore per tutti i service handler HTTP
//!
//! Questo modulo organizza i service handlers in sotto-moduli separati per una migliore manutenibilità.
//! Ogni modulo gestisce gli endpoint HTTP per una specifica funzionalità.

pub mod auth;
pub mod bootstrap;
pub mod system_configuration;
pub mod user;

// Re-exports per facilitare l'import
pub use auth::{change_password, login_user, logout_user};
pub use bootstrap::ensure_admin_user;
pub use system_configuration::{get_configuration, list_configurations, upsert_configuration};
pub use user::{
    create_user, deactivate_user, delete_user, get_user_by_id, list_users,
    purge_deactivated_users, update_user,
};

use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

/// Root endpoint - health check
pub async fn root(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, "Server is running!")
}
