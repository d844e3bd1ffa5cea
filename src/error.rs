//! Typed errors, the stable error-code taxonomy, and HTTP mapping.

use crate::response::error_envelope;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Machine-readable failure codes surfaced in the `error` field of every failed response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    ValidationError,
    MissingKey,
    NotFound,
    DuplicateKey,
    InvalidReference,
    Referenced,
    InfrastructureError,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "VALIDATION_ERROR",
            ErrorKind::MissingKey => "MISSING_KEY",
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::DuplicateKey => "DUPLICATE_KEY",
            ErrorKind::InvalidReference => "INVALID_REFERENCE",
            ErrorKind::Referenced => "REFERENCED",
            ErrorKind::InfrastructureError => "INFRASTRUCTURE_ERROR",
        }
    }

    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InfrastructureError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::ValidationError
            | ErrorKind::MissingKey
            | ErrorKind::DuplicateKey
            | ErrorKind::InvalidReference
            | ErrorKind::Referenced => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("entity '{resource}': {reason}")]
    InvalidEntity { resource: String, reason: String },
    #[error("entity '{resource}': unknown column '{column}' in {context}")]
    UnknownColumn {
        resource: String,
        column: String,
        context: &'static str,
    },
    #[error("duplicate resource path: {0}")]
    DuplicateResource(String),
    #[error("config load: {0}")]
    Load(String),
    #[error("settings: {0}")]
    Settings(String),
}

/// Expected business outcome of a write that did not succeed (not found, constraint violation, ...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl OperationFailure {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        OperationFailure {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }
}

/// Result of create/update/delete: `Err` carries an expected failure, never an infrastructure fault.
pub type OperationResult<T> = Result<T, OperationFailure>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("validation: {0}")]
    Validation(String),
    #[error("missing key: {0}")]
    MissingKey(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("duplicate key: {0}")]
    DuplicateKey(String),
    #[error("invalid reference: {0}")]
    InvalidReference(String),
    #[error("still referenced: {0}")]
    Referenced(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("infrastructure: {0}")]
    Infrastructure(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::ValidationError,
            AppError::MissingKey(_) => ErrorKind::MissingKey,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::DuplicateKey(_) => ErrorKind::DuplicateKey,
            AppError::InvalidReference(_) => ErrorKind::InvalidReference,
            AppError::Referenced(_) => ErrorKind::Referenced,
            AppError::Config(_) | AppError::Db(_) | AppError::Infrastructure(_) => {
                ErrorKind::InfrastructureError
            }
        }
    }

    /// Message shown to the client. Infrastructure details stay in the log.
    fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::InfrastructureError => "internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<OperationFailure> for AppError {
    fn from(f: OperationFailure) -> Self {
        match f.kind {
            ErrorKind::ValidationError => AppError::Validation(f.message),
            ErrorKind::MissingKey => AppError::MissingKey(f.message),
            ErrorKind::NotFound => AppError::NotFound(f.message),
            ErrorKind::DuplicateKey => AppError::DuplicateKey(f.message),
            ErrorKind::InvalidReference => AppError::InvalidReference(f.message),
            ErrorKind::Referenced => AppError::Referenced(f.message),
            ErrorKind::InfrastructureError => AppError::Infrastructure(f.message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        if kind == ErrorKind::InfrastructureError {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(code = kind.code(), error = %self, "request rejected");
        }
        let body = error_envelope(kind, self.public_message());
        (kind.status(), Json(body)).into_response()
    }
}
