//! Auth - Token JWT e middleware di autenticazione

use crate::core::{AppError, AppState};
use crate::entities::{User, UserType};
use axum::extract::State;
use axum::{Error, body::Body, extract::Request, http, http::Response, middleware::Next};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// struct che codifica il contenuto del token jwt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // User id
    pub username: String,
    pub full_name: String,
    pub user_type: UserType,
    pub password_expired: bool,
    pub jti: String, // Unique id of this login, compared with users.active_token_id
    pub iat: usize,  // Issued at time of the token
    pub exp: usize,  // Expiry time of the token
}

impl Claims {
    /// `None` when the expiry falls outside the representable time range
    pub fn new(user: &User, jti: String, lifetime: Duration, password_expired: bool) -> Option<Self> {
        let now = Utc::now();
        let expires_at = now.checked_add_signed(lifetime)?;
        Some(Self {
            sub: user.id,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            user_type: user.user_type,
            password_expired,
            jti,
            iat: now.timestamp() as usize,
            exp: expires_at.timestamp() as usize,
        })
    }
}

#[instrument(skip(claims, secret), fields(username = %claims.username, jti = %claims.jti))]
pub fn encode_jwt(claims: &Claims, secret: &str) -> Result<String, Error> {
    debug!("Encoding JWT token for user");
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map(|token| {
        info!("JWT token encoded successfully");
        token
    })
    .map_err(|e| {
        error!("Failed to encode JWT token: {:?}", e);
        Error::new("Error in encoding jwt token")
    })
}

#[instrument(skip(jwt_token, secret))]
pub fn decode_jwt(jwt_token: &str, secret: &str) -> Result<TokenData<Claims>, Error> {
    debug!("Decoding JWT token");
    decode::<Claims>(
        jwt_token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )
    .map(|data| {
        debug!("JWT token decoded successfully for user: {}", data.claims.username);
        data
    })
    .map_err(|e| {
        warn!("Failed to decode JWT token: {:?}", e);
        Error::new("Error in decoding jwt token")
    })
}

/// Extracts the token from an `Authorization: Bearer <token>` header value
fn bearer_token(header: &str) -> Option<&str> {
    let mut parts = header.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Some(token),
        _ => None,
    }
}

#[instrument(skip(state, req, next))]
pub async fn authentication_middleware(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response<Body>, AppError> {
    debug!("Running authentication middleware");
    let auth_header = match req.headers().get(http::header::AUTHORIZATION) {
        Some(header) => header.to_str().map_err(|_| {
            warn!("Invalid authorization header format");
            AppError::unauthorized("Invalid authorization header")
        })?,
        None => {
            warn!("Missing authorization header");
            return Err(AppError::unauthorized("Please add the JWT token to the header"));
        }
    };

    let token = bearer_token(auth_header).ok_or_else(|| {
        warn!("Authorization header is not a bearer token");
        AppError::unauthorized("Expected a bearer token")
    })?;

    let token_data = decode_jwt(token, &state.jwt_secret).map_err(|_| {
        AppError::unauthorized("Unable to decode token")
    })?;
    let claims = token_data.claims;

    // Fetch the user details from the database, deactivated users are not loaded
    let current_user = match state
        .users
        .get(&claims.sub, false, &state.request_token())
        .await?
    {
        Some(user) => user,
        None => {
            warn!("User not found or deactivated: {}", claims.username);
            return Err(AppError::unauthorized("You are not an authorized user"));
        }
    };

    // solo l'ultimo token emesso al login è valido
    if current_user.active_token_id.as_deref() != Some(claims.jti.as_str()) {
        warn!("Token {} is no longer active for {}", claims.jti, current_user.username);
        return Err(AppError::unauthorized("Token is no longer valid"));
    }

    info!("User authenticated: {}", current_user.username);
    req.extensions_mut().insert(current_user);
    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Helper function per verificare che un utente abbia uno dei tipi richiesti
///
/// # Arguments
/// * `user` - L'utente autenticato
/// * `allowed` - Lista di tipi utente permessi
///
/// # Returns
/// * `Ok(())` se il tipo è permesso
/// * `Err(AppError)` con 403 altrimenti
#[instrument(skip(user), fields(username = %user.username))]
pub fn require_user_type(user: &User, allowed: &[UserType]) -> Result<(), AppError> {
    if !allowed.contains(&user.user_type) {
        warn!(
            "User {} has insufficient type {:?}, required one of: {:?}",
            user.username, user.user_type, allowed
        );
        return Err(AppError::forbidden("Insufficient privileges").with_details(format!(
            "This action requires one of the following user types: {:?}",
            allowed
        )));
    }
    debug!("User type check passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User::new("mrossi", "Mario Rossi", "hash".to_string(), UserType::Operator)
    }

    #[test]
    fn test_encode_then_decode() {
        let user = sample_user();
        let claims = Claims::new(&user, "jti-1".to_string(), Duration::hours(1), false).unwrap();
        let token = encode_jwt(&claims, "secret").unwrap();

        let decoded = decode_jwt(&token, "secret").unwrap().claims;
        assert_eq!(decoded.sub, user.id);
        assert_eq!(decoded.jti, "jti-1");
        assert_eq!(decoded.user_type, UserType::Operator);
        assert!(!decoded.password_expired);

        assert!(decode_jwt(&token, "another secret").is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let claims = Claims::new(&sample_user(), "jti".to_string(), Duration::hours(-2), false).unwrap();
        let token = encode_jwt(&claims, "secret").unwrap();
        assert!(decode_jwt(&token, "secret").is_err());
    }

    #[test]
    fn test_out_of_range_lifetime_yields_no_claims() {
        assert!(Claims::new(&sample_user(), "jti".to_string(), Duration::MAX, false).is_none());
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer  abc"), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer a b"), None);
    }

    #[test]
    fn test_require_user_type() {
        let user = sample_user();
        assert!(require_user_type(&user, &[UserType::Admin, UserType::Operator]).is_ok());
        let err = require_user_type(&user, &[UserType::Admin]).unwrap_err();
        assert_eq!(err.status(), http::StatusCode::FORBIDDEN);
    }
}
