// Centralized error handling for the notice board

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{ErrorResponse, Role};

/// Rejected registration or notice input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at most {0} bytes")]
    PasswordTooLong(usize),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Email already registered")]
    EmailTaken,

    #[error("Unknown role: {0}")]
    UnknownRole(String),

    #[error("Role {0} cannot be chosen at registration")]
    RoleNotSelfAssignable(Role),

    #[error("Unknown priority: {0}")]
    UnknownPriority(String),

    #[error("Invalid request body: {0}")]
    MalformedBody(String),
}

/// Identity failures: bad credentials or no usable session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Please login to access this page")]
    MissingSession,

    #[error("Invalid session token")]
    InvalidToken,

    #[error("Session has ended")]
    SessionEnded,

    #[error("Session has expired")]
    SessionExpired,

    #[error("{0} access required")]
    RoleRequired(Role),
}

/// Role or ownership checks that failed for an identified caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationError {
    #[error("Only teachers and admins can create notices")]
    CreateRequiresStaff,

    #[error("You do not have permission to modify this notice")]
    NotOwnerOrAdmin,

    #[error("Admins cannot delete or demote their own account")]
    OwnAccount,
}

/// Failures of the persistent store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("duplicate value for unique field {0}")]
    Duplicate(&'static str),

    #[error("referenced {0} does not exist")]
    MissingReference(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Top-level error returned by services and handlers.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn notice_not_found(id: Uuid) -> Self {
        AppError::NotFound { entity: "Notice", id }
    }

    pub fn user_not_found(id: Uuid) -> Self {
        AppError::NotFound { entity: "User", id }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Auth(AuthError::RoleRequired(_)) => StatusCode::FORBIDDEN,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Authorization(_) => StatusCode::FORBIDDEN,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Details stay in the logs.
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
