//! Application error handling

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use patient_core::{IssueType, OperationOutcome, PatientError};

/// Application error type
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    Unavailable(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, outcome) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, OperationOutcome::not_found(&msg)),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, OperationOutcome::invalid(&msg)),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, OperationOutcome::duplicate(&msg)),
            AppError::Unavailable(msg) => {
                tracing::error!(error = %msg, "Patient store unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    OperationOutcome::error(IssueType::Transient, &msg),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    OperationOutcome::error(IssueType::Exception, &msg),
                )
            }
        };

        (status, Json(outcome)).into_response()
    }
}

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        let msg = err.to_string();
        match err {
            PatientError::Validation(_) => AppError::BadRequest(msg),
            PatientError::DuplicateIdentity(_) => AppError::Conflict(msg),
            PatientError::NotFound(_) => AppError::NotFound(msg),
            PatientError::StoreUnavailable(_) => AppError::Unavailable(msg),
        }
    }
}

impl From<axum::http::header::InvalidHeaderValue> for AppError {
    fn from(err: axum::http::header::InvalidHeaderValue) -> Self {
        AppError::Internal(format!("Invalid header value: {}", err))
    }
}
