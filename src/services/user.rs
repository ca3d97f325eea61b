//! User services - Gestione utenti

use crate::core::{AppError, AppState, require_user_type};
use crate::dtos::{CreateUserDTO, UpdateUserDTO, UserDTO, UserSearchQuery, VisibilityQuery};
use crate::entities::{User, UserType};
use crate::repositories::{Criteria, UserRepository};
use axum::{
    Extension,
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

const DEFAULT_SEARCH_LIMIT: i64 = 100;
const MAX_SEARCH_LIMIT: i64 = 500;

#[instrument(skip(state, params), fields(search = ?params.search, include_deleted = params.include_deleted))]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UserSearchQuery>, // query params /users?search=username
) -> Result<Json<Vec<UserDTO>>, AppError> {
    debug!("Searching users");
    let limit = params
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);
    let users = state
        .users
        .search(
            params.search.as_deref(),
            params.include_deleted,
            limit,
            &state.request_token(),
        )
        .await?;
    info!("Found {} users matching search criteria", users.len());
    Ok(Json(users.into_iter().map(UserDTO::from).collect()))
}

#[instrument(skip(state, params), fields(user_id = %user_id))]
pub async fn get_user_by_id(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>, // parametro dalla URL /users/{user_id}
    Query(params): Query<VisibilityQuery>,
) -> Result<Json<UserDTO>, AppError> {
    debug!("Fetching user by ID");
    let user = state
        .users
        .get(&user_id, params.include_deleted, &state.request_token())
        .await?
        .ok_or_else(|| {
            warn!("User not found");
            AppError::not_found("User not found")
        })?;
    Ok(Json(UserDTO::from(user)))
}

#[instrument(skip(state, current_user, body), fields(admin = %current_user.username, username = %body.username))]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Json(body): Json<CreateUserDTO>,
) -> Result<(StatusCode, Json<UserDTO>), AppError> {
    // 1. Solo gli amministratori possono creare utenti
    // 2. Validare il DTO con validator (username, nome completo, password)
    // 3. Lo username è univoco anche rispetto agli utenti disattivati
    // 4. Generare l'hash della password e salvare il nuovo utente
    require_user_type(&current_user, &[UserType::Admin])?;
    body.validate()?;

    let cancel = state.request_token();
    if state
        .users
        .any(Criteria::eq("username", body.username.as_str()), &cancel)
        .await?
    {
        return Err(AppError::conflict("Username already exists"));
    }

    let password_hash = User::hash_password(&body.password, state.password_cost)
        .map_err(|_| AppError::internal_server_error("Failed to hash password"))?;
    let new_user = User::new(&body.username, &body.full_name, password_hash, body.user_type);

    let mut ctx = state.context();
    let created_user = state.users.insert(&mut ctx, new_user).await?;

    info!("User created with id {}", created_user.id);
    Ok((StatusCode::CREATED, Json(UserDTO::from(created_user))))
}

#[instrument(skip(state, current_user, body), fields(admin = %current_user.username, user_id = %user_id))]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<UpdateUserDTO>,
) -> Result<Json<UserDTO>, AppError> {
    require_user_type(&current_user, &[UserType::Admin])?;
    body.validate()?;

    let cancel = state.request_token();
    let mut user = state
        .users
        .get(&user_id, true, &cancel)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if user.username != body.username
        && state
            .users
            .any(Criteria::eq("username", body.username.as_str()), &cancel)
            .await?
    {
        return Err(AppError::conflict("Username already exists"));
    }

    user.username = body.username;
    user.full_name = body.full_name;
    user.user_type = body.user_type;
    // la versione letta dal client decide se l'aggiornamento è ancora valido
    user.audit.row_version = body.row_version;

    let mut ctx = state.context();
    let updated = state.users.update(&mut ctx, user).await?;

    info!("User updated to version {}", updated.audit.row_version);
    Ok(Json(UserDTO::from(updated)))
}

/// Soft delete: the user disappears from default reads and loses its token
#[instrument(skip(state, current_user), fields(admin = %current_user.username, user_id = %user_id))]
pub async fn deactivate_user(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserDTO>, AppError> {
    require_user_type(&current_user, &[UserType::Admin])?;
    if user_id == current_user.id {
        return Err(AppError::bad_request("You cannot deactivate your own account"));
    }

    let mut user = state
        .users
        .get(&user_id, false, &state.request_token())
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    user.audit.is_deleted = true;
    user.active_token_id = None;

    let mut ctx = state.context();
    let updated = state.users.update(&mut ctx, user).await?;

    info!("User deactivated");
    Ok(Json(UserDTO::from(updated)))
}

#[instrument(skip(state, current_user), fields(admin = %current_user.username, user_id = %user_id))]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    require_user_type(&current_user, &[UserType::Admin])?;
    if user_id == current_user.id {
        return Err(AppError::bad_request("You cannot delete your own account"));
    }

    let user = state
        .users
        .get(&user_id, true, &state.request_token())
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let mut ctx = state.context();
    state.users.delete(&mut ctx, user).await?;

    info!("User deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Hard-deletes every deactivated user in one transaction
#[instrument(skip(state, current_user), fields(admin = %current_user.username))]
pub async fn purge_deactivated_users(
    State(state): State<Arc<AppState>>,
    Extension(current_user): Extension<User>,
) -> Result<Json<Vec<UserDTO>>, AppError> {
    require_user_type(&current_user, &[UserType::Admin])?;

    let mut ctx = state.context();
    let cancel = ctx.cancellation().clone();
    let deleted = state
        .users
        .delete_many(&mut ctx, UserRepository::deactivated(), &cancel)
        .await?;

    info!("Purged {} deactivated users", deleted.len());
    Ok(Json(deleted.into_iter().map(UserDTO::from).collect()))
}
