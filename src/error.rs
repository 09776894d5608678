//! Application-level error taxonomy.
//!
//! Every failure is caught at the repository/client boundary and turned
//! into an `AppError`. View models show `user_message()`; the HTTP layer
//! maps `kind()` to a status code. Nothing here is fatal to the process.

use serde::Serialize;
use thiserror::Error;

use crate::credential::CredentialError;
use crate::db::DatabaseError;
use crate::icd::IcdError;

/// Coarse classification used for messages and status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Authentication,
    MalformedResponse,
    Store,
    NotFound,
    Validation,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Store error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Disease lookup error: {0}")]
    Icd(#[from] IcdError),

    #[error("Invalid {entity}: {reason}")]
    Validation { entity: String, reason: String },

    #[error("Background task failed: {0}")]
    Task(String),
}

impl AppError {
    pub fn validation(entity: &str, reason: impl Into<String>) -> Self {
        AppError::Validation {
            entity: entity.to_string(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Database(e) => database_kind(e),
            AppError::Credential(e) => credential_kind(e),
            AppError::Icd(e) => match e {
                IcdError::Credential(inner) => credential_kind(inner),
                IcdError::Connection(_) | IcdError::HttpClient(_) => ErrorKind::Network,
                IcdError::Unauthorized => ErrorKind::Authentication,
                IcdError::ApiError { status: 401 | 403, .. } => ErrorKind::Authentication,
                IcdError::ApiError { .. } | IcdError::SearchFailed(_) => ErrorKind::Network,
                IcdError::ResponseParsing(_) => ErrorKind::MalformedResponse,
            },
            AppError::Validation { .. } => ErrorKind::Validation,
            AppError::Task(_) => ErrorKind::Store,
        }
    }

    /// Text suitable for an error banner.
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Network => {
                "Could not reach the disease catalogue. Check your connection and try again."
                    .to_string()
            }
            ErrorKind::Authentication => {
                "The disease catalogue rejected our credentials. Try again in a moment."
                    .to_string()
            }
            ErrorKind::MalformedResponse => {
                "The disease catalogue sent an unexpected response.".to_string()
            }
            ErrorKind::NotFound => match self {
                AppError::Database(DatabaseError::NotFound { entity_type, .. }) => {
                    format!("The requested {} no longer exists.", describe(entity_type))
                }
                _ => "The requested item no longer exists.".to_string(),
            },
            ErrorKind::Validation => match self {
                AppError::Validation { reason, .. } => reason.clone(),
                AppError::Database(DatabaseError::ConstraintViolation(reason)) => reason.clone(),
                _ => "Some fields are invalid.".to_string(),
            },
            ErrorKind::Store => "Could not save or load records. Please retry.".to_string(),
        }
    }
}

/// Failures that stop the service from starting.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Credential client error: {0}")]
    Credential(#[from] CredentialError),

    #[error("ICD client error: {0}")]
    Icd(#[from] IcdError),

    #[error("Runtime error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Server(String),
}

/// Run a blocking store or client call on the blocking pool.
pub async fn run_blocking<R, F>(f: F) -> Result<R, AppError>
where
    F: FnOnce() -> Result<R, AppError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Task(e.to_string()))?
}

fn database_kind(e: &DatabaseError) -> ErrorKind {
    match e {
        DatabaseError::NotFound { .. } => ErrorKind::NotFound,
        DatabaseError::ConstraintViolation(_) => ErrorKind::Validation,
        DatabaseError::Serialization(_)
        | DatabaseError::Sqlite(_)
        | DatabaseError::MigrationFailed { .. }
        | DatabaseError::LockPoisoned => ErrorKind::Store,
    }
}

fn credential_kind(e: &CredentialError) -> ErrorKind {
    match e {
        CredentialError::Connection(_) | CredentialError::HttpClient(_) => ErrorKind::Network,
        CredentialError::Rejected { .. } => ErrorKind::Authentication,
        CredentialError::ResponseParsing(_) => ErrorKind::MalformedResponse,
        CredentialError::Storage(_) | CredentialError::LockPoisoned => ErrorKind::Store,
    }
}

/// "patients/abc/blood_pressure" → "blood pressure record".
fn describe(collection: &str) -> String {
    match collection.rsplit('/').next() {
        Some("patients") | None => "patient".to_string(),
        Some(name) => format!("{} record", name.replace('_', " ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_record_type() {
        let err = AppError::from(DatabaseError::NotFound {
            entity_type: "patients/p1/blood_pressure".into(),
            id: "x".into(),
        });
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(
            err.user_message(),
            "The requested blood pressure record no longer exists."
        );
    }

    #[test]
    fn missing_patient_message() {
        let err = AppError::from(DatabaseError::NotFound {
            entity_type: "patients".into(),
            id: "x".into(),
        });
        assert_eq!(err.user_message(), "The requested patient no longer exists.");
    }

    #[test]
    fn credential_rejection_is_authentication() {
        let err = AppError::from(IcdError::Credential(CredentialError::Rejected {
            status: 401,
            body: String::new(),
        }));
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn connection_failures_are_network() {
        let err = AppError::from(IcdError::Connection("http://x".into()));
        assert_eq!(err.kind(), ErrorKind::Network);
        let err = AppError::from(CredentialError::Connection("http://x".into()));
        assert_eq!(err.kind(), ErrorKind::Network);
    }

    #[test]
    fn parsing_failures_are_malformed() {
        let err = AppError::from(IcdError::ResponseParsing("eof".into()));
        assert_eq!(err.kind(), ErrorKind::MalformedResponse);
    }

    #[test]
    fn validation_message_is_the_reason() {
        let err = AppError::validation("allergy", "allergen is required");
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.user_message(), "allergen is required");
    }

    #[test]
    fn sqlite_failure_is_store() {
        let err = AppError::from(DatabaseError::Sqlite(rusqlite::Error::InvalidQuery));
        assert_eq!(err.kind(), ErrorKind::Store);
    }
}
