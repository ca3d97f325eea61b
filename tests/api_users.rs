//! Integration tests per gli endpoints degli utenti
//!
//! Test per:
//! - GET /users?search=username
//! - GET /users/{user_id}
//! - POST /users
//! - PUT /users/{user_id}
//! - POST /users/{user_id}/deactivate
//! - DELETE /users/{user_id}
//! - DELETE /users/deactivated

mod common;

#[cfg(test)]
mod user_tests {
    use super::common::*;
    use axum::http::StatusCode;
    use backoffice::dtos::UserDTO;
    use backoffice::entities::UserType;
    use serde_json::json;
    use sqlx::SqlitePool;

    #[sqlx::test]
    async fn test_create_and_get_user(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let token = admin_token(&state, &server).await;

        let response = server
            .post("/users")
            .authorization_bearer(&token)
            .json(&json!({
                "username": "mario.rossi",
                "full_name": "Mario Rossi",
                "password": "Password123",
                "user_type": "OPERATOR"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: UserDTO = response.json();
        assert_eq!(created.username, "mario.rossi");
        assert_eq!(created.user_type, UserType::Operator);
        assert_eq!(created.row_version, 1);

        let response = server
            .get(&format!("/users/{}", created.id))
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<UserDTO>(), created);

        // il nuovo utente può fare login
        login(&server, "mario.rossi").await;

        Ok(())
    }

    #[sqlx::test]
    async fn test_create_user_validation_and_conflict(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let token = admin_token(&state, &server).await;

        server
            .post("/users")
            .authorization_bearer(&token)
            .json(&json!({
                "username": "no spaces allowed",
                "full_name": "Invalid",
                "password": "Password123",
                "user_type": "VIEWER"
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        server
            .post("/users")
            .authorization_bearer(&token)
            .json(&json!({
                "username": "admin",
                "full_name": "Duplicate",
                "password": "Password123",
                "user_type": "VIEWER"
            }))
            .await
            .assert_status(StatusCode::CONFLICT);

        Ok(())
    }

    #[sqlx::test]
    async fn test_non_admin_cannot_manage_users(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let viewer = seed_user(&state, "viewer", UserType::Viewer).await;
        let token = login(&server, "viewer").await;

        server
            .post("/users")
            .authorization_bearer(&token)
            .json(&json!({
                "username": "someone",
                "full_name": "Someone",
                "password": "Password123",
                "user_type": "VIEWER"
            }))
            .await
            .assert_status(StatusCode::FORBIDDEN);

        server
            .delete(&format!("/users/{}", viewer.id))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::FORBIDDEN);

        // la lettura è permessa a tutti gli utenti autenticati
        server
            .get(&format!("/users/{}", viewer.id))
            .authorization_bearer(&token)
            .await
            .assert_status_ok();

        Ok(())
    }

    #[sqlx::test]
    async fn test_get_missing_user_is_not_found(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let token = admin_token(&state, &server).await;

        server
            .get(&format!("/users/{}", uuid::Uuid::new_v4()))
            .authorization_bearer(&token)
            .await
            .assert_status_not_found();

        Ok(())
    }

    #[sqlx::test]
    async fn test_search_users(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let token = admin_token(&state, &server).await;
        for name in ["alice", "alberto", "bruno"] {
            seed_user(&state, name, UserType::Viewer).await;
        }

        let response = server
            .get("/users")
            .add_query_param("search", "al")
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        let users: Vec<UserDTO> = response.json();
        let names: Vec<_> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["alberto", "alice"]);

        let all: Vec<UserDTO> = server.get("/users").authorization_bearer(&token).await.json();
        assert_eq!(all.len(), 4);

        Ok(())
    }

    #[sqlx::test]
    async fn test_update_user_with_stale_version_conflicts(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let token = admin_token(&state, &server).await;
        let user = seed_user(&state, "luca", UserType::Viewer).await;

        let body = json!({
            "username": "luca",
            "full_name": "Luca Bianchi",
            "user_type": "OPERATOR",
            "row_version": user.audit.row_version
        });

        let response = server
            .put(&format!("/users/{}", user.id))
            .authorization_bearer(&token)
            .json(&body)
            .await;
        response.assert_status_ok();
        let updated: UserDTO = response.json();
        assert_eq!(updated.full_name, "Luca Bianchi");
        assert_eq!(updated.user_type, UserType::Operator);
        assert_eq!(updated.row_version, user.audit.row_version + 1);

        // stessa versione di prima: qualcun altro ha già scritto
        server
            .put(&format!("/users/{}", user.id))
            .authorization_bearer(&token)
            .json(&body)
            .await
            .assert_status(StatusCode::CONFLICT);

        server
            .put(&format!("/users/{}", user.id))
            .authorization_bearer(&token)
            .json(&json!({
                "username": "luca",
                "full_name": "Luca Bianchi",
                "user_type": "OPERATOR",
                "row_version": i64::MAX
            }))
            .await
            .assert_status(StatusCode::CONFLICT);

        Ok(())
    }

    #[sqlx::test]
    async fn test_deactivate_then_purge(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let token = admin_token(&state, &server).await;
        let user = seed_user(&state, "temp", UserType::Viewer).await;
        seed_user(&state, "stays", UserType::Viewer).await;

        let response = server
            .post(&format!("/users/{}/deactivate", user.id))
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        assert!(response.json::<UserDTO>().is_deleted);

        // non più visibile di default, ma ancora leggibile su richiesta
        server
            .get(&format!("/users/{}", user.id))
            .authorization_bearer(&token)
            .await
            .assert_status_not_found();
        server
            .get(&format!("/users/{}", user.id))
            .add_query_param("include_deleted", true)
            .authorization_bearer(&token)
            .await
            .assert_status_ok();

        let response = server
            .delete("/users/deactivated")
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        let purged: Vec<UserDTO> = response.json();
        assert_eq!(purged.len(), 1);
        assert_eq!(purged[0].id, user.id);

        let remaining: Vec<UserDTO> = server
            .get("/users")
            .add_query_param("include_deleted", true)
            .authorization_bearer(&token)
            .await
            .json();
        assert_eq!(remaining.len(), 2);

        Ok(())
    }

    #[sqlx::test]
    async fn test_delete_user(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let token = admin_token(&state, &server).await;
        let user = seed_user(&state, "erased", UserType::Viewer).await;

        server
            .delete(&format!("/users/{}", user.id))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::NO_CONTENT);

        server
            .get(&format!("/users/{}", user.id))
            .add_query_param("include_deleted", true)
            .authorization_bearer(&token)
            .await
            .assert_status_not_found();

        Ok(())
    }

    #[sqlx::test]
    async fn test_admin_cannot_remove_itself(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state.clone());
        let token = admin_token(&state, &server).await;
        let admin = state
            .users
            .find_by_username("admin", &state.request_token())
            .await
            .unwrap()
            .unwrap();

        server
            .post(&format!("/users/{}/deactivate", admin.id))
            .authorization_bearer(&token)
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        Ok(())
    }
}
