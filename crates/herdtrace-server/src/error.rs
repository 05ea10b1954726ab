//! HTTP error mapping.
//!
//! Domain errors from the core crate convert into [`AppError`], which
//! renders as `{success: false, message}` with the matching status code.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use herdtrace_core::{ConsultError, DbError, TreatmentError};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden(message.into())
    }
}

/// Error body shared by every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message),
            AppError::Validation(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Forbidden(message) => (StatusCode::FORBIDDEN, message),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            AppError::Conflict(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Internal(err) => {
                error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = ErrorBody {
            success: false,
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        AppError::Internal(err.into())
    }
}

impl From<TreatmentError> for AppError {
    fn from(err: TreatmentError) -> Self {
        match err {
            TreatmentError::AccessDenied => AppError::Forbidden(err.to_string()),
            TreatmentError::UnknownMedicine(_) => AppError::NotFound(err.to_string()),
            TreatmentError::BannedDrug(_) => AppError::Conflict(err.to_string()),
            TreatmentError::Db(db) => db.into(),
        }
    }
}

impl From<ConsultError> for AppError {
    fn from(err: ConsultError) -> Self {
        match err {
            ConsultError::Validation(message) => AppError::Validation(message),
            ConsultError::NotFound | ConsultError::NoVetsNearby => {
                AppError::NotFound(err.to_string())
            }
            ConsultError::VetRoleRequired => AppError::Forbidden(err.to_string()),
            ConsultError::AlreadyResolved(_) => AppError::Conflict(err.to_string()),
            ConsultError::Db(db) => db.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herdtrace_core::ConsultationStatus;

    #[test]
    fn test_treatment_error_mapping() {
        assert!(matches!(
            AppError::from(TreatmentError::AccessDenied),
            AppError::Forbidden(_)
        ));
        assert!(matches!(
            AppError::from(TreatmentError::UnknownMedicine("Turmeric".to_string())),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(TreatmentError::BannedDrug("Chloramphenicol".to_string())),
            AppError::Conflict(_)
        ));
    }

    #[test]
    fn test_consult_error_mapping() {
        assert!(matches!(
            AppError::from(ConsultError::NoVetsNearby),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(ConsultError::VetRoleRequired),
            AppError::Forbidden(_)
        ));
        let already = AppError::from(ConsultError::AlreadyResolved(ConsultationStatus::Active));
        assert_eq!(already.to_string(), "Consultation is already active");
        assert!(matches!(already, AppError::Conflict(_)));
    }
}
