use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Customer not found with id {0}")]
    NotFound(i64),
    #[error("Email {0} already exists")]
    EmailConflict(String),
    #[error("database error")]
    Database(#[from] sqlx::Error),
    #[error("storage error: {0}")]
    Storage(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    status: u16,
    message: String,
}

impl AppError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(id) => (
                StatusCode::NOT_FOUND,
                format!("Customer not found with id {id}"),
            ),
            Self::EmailConflict(email) => (
                StatusCode::BAD_REQUEST,
                format!("Email {email} already exists"),
            ),
            Self::Database(err) => match &err {
                // The unique index on email is the authoritative guard; a
                // violation slipping past the pre-check still maps to 400.
                sqlx::Error::Database(db_err)
                    if db_err.code().as_deref() == Some("23505") =>
                {
                    (StatusCode::BAD_REQUEST, "Email already exists".to_string())
                }
                _ => {
                    error!(error = %err, "database operation failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Unexpected Error".to_string(),
                    )
                }
            },
            Self::Storage(msg) => {
                error!(error = %msg, "storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Unexpected Error".to_string(),
                )
            }
        };

        let body = ErrorBody {
            status: status.as_u16(),
            message,
        };

        (status, Json(body)).into_response()
    }
}
