//! Bootstrap - Creazione dell'amministratore iniziale

use crate::core::{AppError, AppState};
use crate::entities::{User, UserType};
use crate::repositories::Criteria;
use tracing::{info, instrument, warn};

/// Creates an administrator when the database has no active one
///
/// # Returns
/// * `Ok(Some(User))` - Administrator created
/// * `Ok(None)` - An active administrator exists already, or the username is taken
#[instrument(skip(state, password))]
pub async fn ensure_admin_user(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    let cancel = state.request_token();
    if state.users.has_active_admin(&cancel).await? {
        return Ok(None);
    }
    if state.users.any(Criteria::eq("username", username), &cancel).await? {
        warn!("No active administrator, but username {} is already taken", username);
        return Ok(None);
    }

    let password_hash = User::hash_password(password, state.password_cost)
        .map_err(|_| AppError::internal_server_error("Failed to hash password"))?;
    let admin = User::new(username, "Administrator", password_hash, UserType::Admin);

    let mut ctx = state.context();
    let admin = state.users.insert(&mut ctx, admin).await?;
    info!("Bootstrap administrator created");
    Ok(Some(admin))
}
