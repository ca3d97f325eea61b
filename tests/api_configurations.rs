//! Integration tests per gli endpoints della configurazione di sistema
//!
//! Test per:
//! - GET /configurations
//! - GET /configurations/{key}
//! - PUT /configurations
//! - creazione dell'amministratore iniziale

mod common;

#[cfg(test)]
mod configuration_tests {
    use super::common::*;
    use axum::http::StatusCode;
    use backoffice::dtos::SystemConfigurationDTO;
    use backoffice::entities::{ConfigKey, ConfigUnit, UserType};
    use backoffice::services::ensure_admin_user;
    use serde_json::json;
    use sqlx::SqlitePool;

    #[sqlx::test]
    async fn test_upsert_and_read_configuration(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let token = admin_token(&state, &server).await;

        let response = server
            .put("/configurations")
            .authorization_bearer(&token)
            .json(&json!({
                "key": "tokenlifetime",
                "unit": "HOURS",
                "value": "8",
                "description": "Durata del token"
            }))
            .await;
        response.assert_status_ok();
        let created: SystemConfigurationDTO = response.json();
        assert_eq!(created.key, ConfigKey::TokenLifetime);
        assert_eq!(created.unit, ConfigUnit::Hours);
        assert_eq!(created.row_version, 1);

        let response = server
            .put("/configurations")
            .authorization_bearer(&token)
            .json(&json!({ "key": "TokenLifetime", "unit": "Minutes", "value": "45" }))
            .await;
        response.assert_status_ok();
        let updated: SystemConfigurationDTO = response.json();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.row_version, 2);
        assert_eq!(updated.description, None);

        let response = server
            .get("/configurations/TOKENLIFETIME")
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<SystemConfigurationDTO>(), updated);

        let all: Vec<SystemConfigurationDTO> = server
            .get("/configurations")
            .authorization_bearer(&token)
            .await
            .json();
        assert_eq!(all.len(), 1);

        Ok(())
    }

    #[sqlx::test]
    async fn test_unknown_key_or_unit_is_bad_request(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let token = admin_token(&state, &server).await;

        server
            .get("/configurations/NotAKey")
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .put("/configurations")
            .authorization_bearer(&token)
            .json(&json!({ "key": "TokenLifetime", "unit": "Fortnights", "value": "1" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .put("/configurations")
            .authorization_bearer(&token)
            .json(&json!({ "key": "MaintenanceMode", "unit": "Flag", "value": "x".repeat(2049) }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .put("/configurations")
            .authorization_bearer(&token)
            .json(&json!({ "key": "PasswordExpiry", "unit": "Days", "value": "100000000" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        Ok(())
    }

    #[sqlx::test]
    async fn test_missing_configuration_is_not_found(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let token = admin_token(&state, &server).await;

        server
            .get("/configurations/MaxLoginAttempts")
            .authorization_bearer(&token)
            .await
            .assert_status_not_found();

        Ok(())
    }

    #[sqlx::test]
    async fn test_only_admins_change_configuration(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        seed_user(&state, "operator", UserType::Operator).await;
        let token = login(&server, "operator").await;

        server
            .put("/configurations")
            .authorization_bearer(&token)
            .json(&json!({ "key": "MaxLoginAttempts", "unit": "Count", "value": "5" }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        server
            .get("/configurations")
            .authorization_bearer(&token)
            .await
            .assert_status_ok();

        Ok(())
    }

    #[sqlx::test]
    async fn test_bootstrap_admin_is_created_once(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());

        let created = ensure_admin_user(&state, "root", TEST_PASSWORD).await.ok().flatten();
        assert!(created.is_some_and(|u| u.user_type == UserType::Admin));

        let again = ensure_admin_user(&state, "root2", TEST_PASSWORD).await.ok().flatten();
        assert!(again.is_none());

        login(&server, "root").await;

        Ok(())
    }
}
