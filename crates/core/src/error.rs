use thiserror::Error;

/// Patient service error types
#[derive(Debug, Error)]
pub enum PatientError {
    #[error("Invalid resource: {0}")]
    Validation(String),

    #[error("Patient with id '{0}' already exists")]
    DuplicateIdentity(String),

    #[error("Patient/{0} not found")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<serde_json::Error> for PatientError {
    fn from(err: serde_json::Error) -> Self {
        PatientError::Validation(err.to_string())
    }
}
