//! Auth services - Login, logout e cambio password

use crate::core::{AppError, AppState, Claims, encode_jwt};
use crate::dtos::{ChangePasswordDTO, LoginDTO, TokenDTO};
use crate::entities::{ConfigKey, User};
use axum::{
    Extension,
    extract::{Json, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

#[instrument(skip(state, body), fields(username = %body.username))]
pub async fn login_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginDTO>, // JSON body
) -> Result<impl IntoResponse, AppError> {
    // 1. Verificare che username e password siano presenti (fail-fast prima della query DB)
    // 2. Cercare l'utente attivo tramite username, se non esiste o la password non
    //    corrisponde ritornare UNAUTHORIZED con lo stesso messaggio
    // 3. Leggere durata del token e scadenza password dalla configurazione di sistema
    // 4. Ruotare active_token_id: il token precedente smette di essere valido
    // 5. Emettere il JWT, restituito sia nel body che nell'header Authorization
    if body.username.trim().is_empty() || body.password.is_empty() {
        return Err(AppError::bad_request("Username and password are required"));
    }

    let cancel = state.request_token();
    let mut user = match state.users.find_by_username(&body.username, &cancel).await? {
        Some(user) if user.verify_password(&body.password) => user,
        _ => {
            warn!("Login failed");
            return Err(AppError::unauthorized("Invalid username or password"));
        }
    };

    let (token_lifetime, password_expiry) = futures::try_join!(
        state.configurations.duration(ConfigKey::TokenLifetime, &cancel),
        state.configurations.duration(ConfigKey::PasswordExpiry, &cancel),
    )?;
    let token_lifetime = token_lifetime.unwrap_or(state.default_token_lifetime);
    let password_expired = user.is_password_expired(password_expiry);

    let jti = Uuid::new_v4().to_string();
    let claims = Claims::new(&user, jti.clone(), token_lifetime, password_expired)
        .ok_or_else(|| AppError::internal_server_error("Token lifetime out of range"))?;

    user.active_token_id = Some(jti);
    let mut ctx = state.context();
    state.users.update(&mut ctx, user).await?;

    let token = encode_jwt(&claims, &state.jwt_secret)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| AppError::internal_server_error("Failed to build authorization header"))?,
    );

    info!("User logged in (password expired: {})", password_expired);
    Ok((
        StatusCode::OK,
        headers,
        Json(TokenDTO {
            token,
            token_type: "Bearer".to_string(),
            expires_in: token_lifetime.num_seconds(),
            password_expired,
        }),
    ))
}

#[instrument(skip(state, current_user), fields(username = %current_user.username))]
pub async fn logout_user(
    State(state): State<Arc<AppState>>,
    Extension(mut current_user): Extension<User>, // ottenuto dall'autenticazione tramite token jwt
) -> Result<StatusCode, AppError> {
    current_user.active_token_id = None;
    let mut ctx = state.context();
    state.users.update(&mut ctx, current_user).await?;

    info!("User logged out");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, current_user, body), fields(username = %current_user.username))]
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(mut current_user): Extension<User>,
    Json(body): Json<ChangePasswordDTO>,
) -> Result<StatusCode, AppError> {
    body.validate()?;

    if !current_user.verify_password(&body.current_password) {
        warn!("Wrong current password");
        return Err(AppError::unauthorized("Current password is not correct"));
    }
    if body.current_password == body.new_password {
        return Err(AppError::bad_request("The new password must differ from the current one"));
    }

    let password_hash = User::hash_password(&body.new_password, state.password_cost)
        .map_err(|_| AppError::internal_server_error("Failed to hash password"))?;
    current_user.set_password_hash(password_hash);

    let mut ctx = state.context();
    state.users.update(&mut ctx, current_user).await?;

    debug!("Password changed");
    Ok(StatusCode::NO_CONTENT)
}
