use thiserror::Error;

use crate::auth::google::GoogleAuthError;
use crate::domain::errors::{DomainError, FieldViolation};
use crate::domain::repositories::RepositoryError;

/// Failures surfaced by the service layer to the HTTP adapter
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    NotFound(String),

    #[error("Validation failed")]
    Validation(Vec<FieldViolation>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn not_found(entity: &str, field: &str, value: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{} not found with {}: {}", entity, field, value))
    }

    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(vec![FieldViolation {
            field: field.to_string(),
            message: message.into(),
        }])
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(violations) => ServiceError::Validation(violations),
            DomainError::NotAssignedAgent { .. } => {
                ServiceError::Forbidden("You are not assigned to this delivery".to_string())
            }
            other => ServiceError::BadRequest(other.to_string()),
        }
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { .. } => ServiceError::NotFound(err.to_string()),
            RepositoryError::Duplicate(field) => {
                let message = format!("{} is already in use", field);
                ServiceError::field(&field, message)
            }
            RepositoryError::Conflict { .. } => ServiceError::Conflict(format!(
                "{}; reload and try again",
                err
            )),
            RepositoryError::Database(message) => ServiceError::Internal(message),
        }
    }
}

impl From<GoogleAuthError> for ServiceError {
    fn from(err: GoogleAuthError) -> Self {
        match err {
            GoogleAuthError::NotConfigured => ServiceError::Internal(err.to_string()),
            GoogleAuthError::Exchange(_) | GoogleAuthError::InvalidToken(_) => {
                ServiceError::Unauthorized(err.to_string())
            }
        }
    }
}
