//! Backoffice library - espone i moduli principali per i test

pub mod core;
pub mod dtos;
pub mod entities;
pub mod repositories;
pub mod services;
pub mod utils;

// Re-export dei tipi principali per facilitare l'import
pub use crate::core::{AppError, AppState, auth, config};
pub use services::root;

use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Crea il router principale dell'applicazione
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .nest("/auth", configure_auth_routes(state.clone()))
        .nest("/users", configure_user_routes(state.clone()))
        .nest("/configurations", configure_configuration_routes(state.clone()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Configura le routes di autenticazione (login pubblico, il resto autenticato)
fn configure_auth_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    let protected = Router::new()
        .route("/logout", post(logout_user))
        .route("/password", put(change_password))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ));

    Router::new()
        .route("/login", post(login_user))
        .merge(protected)
}

/// Configura le routes per la gestione degli utenti
fn configure_user_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/deactivated", delete(purge_deactivated_users))
        .route(
            "/{user_id}",
            get(get_user_by_id).put(update_user).delete(delete_user),
        )
        .route("/{user_id}/deactivate", post(deactivate_user))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}

/// Configura le routes per la configurazione di sistema
fn configure_configuration_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    use crate::core::authentication_middleware;
    use services::*;

    Router::new()
        .route("/", get(list_configurations).put(upsert_configuration))
        .route("/{key}", get(get_configuration))
        .layer(middleware::from_fn_with_state(
            state,
            authentication_middleware,
        ))
}
