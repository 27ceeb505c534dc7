use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::AppState;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::error::EncodeError),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] bincode::error::DecodeError),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No token provided")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Incorrect current password")]
    IncorrectPassword,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Username is already taken")]
    UsernameTaken,

    #[error("User not found")]
    UserNotFound,

    #[error("Record not found")]
    RecordNotFound,

    #[error("Vital sign not found")]
    VitalSignNotFound,
}

impl AppError {
    fn status_and_message(&self) -> (StatusCode, &str) {
        match self {
            AppError::Database(_)
            | AppError::Transaction(_)
            | AppError::Table(_)
            | AppError::Storage(_)
            | AppError::Commit(_)
            | AppError::Serialization(_)
            | AppError::Deserialization(_)
            | AppError::TaskJoin(_)
            | AppError::PasswordHash(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::MissingToken => (
                StatusCode::UNAUTHORIZED,
                "Access denied. No token provided.",
            ),
            AppError::InvalidToken => (StatusCode::FORBIDDEN, "Invalid or expired token."),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            AppError::IncorrectPassword => (StatusCode::BAD_REQUEST, "Incorrect current password"),
            AppError::UserAlreadyExists => {
                (StatusCode::CONFLICT, "Username or email already exists")
            }
            AppError::UsernameTaken => (StatusCode::CONFLICT, "Username is already taken"),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
            AppError::RecordNotFound => (StatusCode::NOT_FOUND, "Record not found"),
            AppError::VitalSignNotFound => (StatusCode::NOT_FOUND, "Vital sign not found"),
        }
    }
}

/// Underlying cause of a 500, carried as a response extension
///
/// [`expose_error_details`] copies it into the body outside production.
#[derive(Debug, Clone)]
pub struct ErrorDetails {
    pub error: String,
    pub details: String,
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = self.status_and_message();
        let error_message = error_message.to_string();

        let mut response = (status, Json(json!({ "error": error_message }))).into_response();

        if status.is_server_error() {
            tracing::error!("{:?}", self);
            response.extensions_mut().insert(ErrorDetails {
                error: error_message,
                details: self.to_string(),
            });
        }

        response
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

/// Add `details` to 500 bodies unless running in production
pub fn with_error_details(response: Response, expose: bool) -> Response {
    if !expose {
        return response;
    }
    let Some(ErrorDetails { error, details }) = response.extensions().get::<ErrorDetails>().cloned()
    else {
        return response;
    };

    (
        response.status(),
        Json(json!({ "error": error, "details": details })),
    )
        .into_response()
}

/// Response-mapping middleware around [`with_error_details`]
pub async fn expose_error_details(State(state): State<AppState>, response: Response) -> Response {
    with_error_details(response, !state.config.is_production())
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;
