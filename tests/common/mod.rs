#![allow(dead_code)]

use axum_test::TestServer;
use backoffice::core::AppState;
use backoffice::entities::{User, UserType};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use std::sync::Arc;

pub const TEST_PASSWORD: &str = "Password123";

/// Crea un AppState per i test
///
/// # Arguments
/// * `pool` - Connection pool SQLite con le migrations applicate
///
/// # Returns
/// Arc<AppState> configurato con il JWT secret di test e bcrypt al costo minimo
pub fn create_test_state(pool: SqlitePool) -> Arc<AppState> {
    let jwt_secret = "ilmiobellissimosegretochevaassolutamentecambiato";
    Arc::new(
        AppState::new(pool, jwt_secret.to_string(), chrono::Duration::hours(24))
            .with_password_cost(4),
    )
}

/// Crea un TestServer per i test
///
/// # Arguments
/// * `state` - AppState da utilizzare per il server
///
/// # Returns
/// TestServer configurato e pronto per eseguire richieste
pub fn create_test_server(state: Arc<AppState>) -> TestServer {
    let app = backoffice::create_router(state);
    TestServer::new(app).expect("Failed to create test server")
}

/// Inserisce un utente con password [`TEST_PASSWORD`] direttamente dal repository
pub async fn seed_user(state: &AppState, username: &str, user_type: UserType) -> User {
    let password_hash = User::hash_password(TEST_PASSWORD, 4).expect("hash");
    let user = User::new(username, &format!("{username} test"), password_hash, user_type);
    let mut ctx = state.context();
    state.users.insert(&mut ctx, user).await.expect("seed user")
}

/// Esegue il login e ritorna il token JWT
pub async fn login(server: &TestServer, username: &str) -> String {
    let response = server
        .post("/auth/login")
        .json(&json!({ "username": username, "password": TEST_PASSWORD }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    body["token"].as_str().expect("token in body").to_string()
}

/// Crea un admin e ritorna il suo token
pub async fn admin_token(state: &AppState, server: &TestServer) -> String {
    seed_user(state, "admin", UserType::Admin).await;
    login(server, "admin").await
}
