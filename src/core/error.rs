//! AppError - Errore HTTP restituito dagli handler

use crate::repositories::RepoError;
use crate::utils::StringError;
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use tracing::error;

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: &'static str,
    details: Option<String>,
}

impl AppError {
    pub fn new(status: StatusCode, message: &'static str) -> Self {
        Self {
            status,
            message,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    // Common error constructors
    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: &'static str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: &'static str) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: &'static str) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn conflict(message: &'static str) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn internal_server_error(message: &'static str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn service_unavailable(message: &'static str) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::not_found("Resource not found"),

            sqlx::Error::Database(db) if db.is_unique_violation() => {
                Self::conflict("Resource already exists")
            }

            sqlx::Error::Database(db) => {
                error!("Database error: {}", db);
                Self::internal_server_error("Database error")
            }

            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                Self::service_unavailable("Database unavailable")
            }

            other => {
                error!("Unexpected database error: {:?}", other);
                Self::internal_server_error("Internal server error")
            }
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound(what) => Self::not_found("Resource not found").with_details(format!("{what} not found")),
            RepoError::Validation(details) => Self::bad_request("Validation error").with_details(details),
            RepoError::ArgumentMissing(arg) => {
                Self::bad_request("Missing argument").with_details(format!("`{arg}` is required"))
            }
            RepoError::ConcurrencyConflict { .. } => Self::conflict("Resource was modified by someone else")
                .with_details(err.to_string()),
            RepoError::Cancelled => Self::service_unavailable("Request cancelled"),
            RepoError::Database(db) => db.into(),
            RepoError::UpdateFailed { .. } => {
                error!("{:?}", err);
                Self::internal_server_error("Internal server error").with_details(err.to_string())
            }
        }
    }
}

impl From<StringError> for AppError {
    fn from(err: StringError) -> Self {
        Self::bad_request("Invalid value").with_details(err.to_string())
    }
}

impl From<axum::Error> for AppError {
    fn from(err: axum::Error) -> Self {
        Self::internal_server_error("Internal server error").with_details(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::bad_request("Validation error").with_details(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(ErrorResponse {
            error: self.message,
            details: self.details,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_error_status_mapping() {
        let cases = [
            (RepoError::NotFound("user"), StatusCode::NOT_FOUND),
            (RepoError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (RepoError::ArgumentMissing("source"), StatusCode::BAD_REQUEST),
            (
                RepoError::ConcurrencyConflict { table: "users", key: "1".into() },
                StatusCode::CONFLICT,
            ),
            (RepoError::Cancelled, StatusCode::SERVICE_UNAVAILABLE),
            (
                RepoError::UpdateFailed {
                    table: "users",
                    source: Box::new(RepoError::Database(sqlx::Error::PoolClosed)),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[tokio::test]
    async fn test_database_error_status_mapping() {
        let pool = crate::repositories::test_utils::memory_pool().await;

        sqlx::query("INSERT INTO notes (id, title, created_at, modified_at) VALUES (1, 'a', '', '')")
            .execute(&pool)
            .await
            .unwrap();
        let duplicate = sqlx::query("INSERT INTO notes (id, title, created_at, modified_at) VALUES (1, 'b', '', '')")
            .execute(&pool)
            .await
            .unwrap_err();
        assert_eq!(AppError::from(duplicate).status(), StatusCode::CONFLICT);

        // riferimento a una nota inesistente
        let dangling = sqlx::query("INSERT INTO note_refs (note_id) VALUES (999)")
            .execute(&pool)
            .await
            .unwrap_err();
        assert!(matches!(dangling, sqlx::Error::Database(_)));
        assert_eq!(AppError::from(dangling).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
