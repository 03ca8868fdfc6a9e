use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use crate::models::application::ApplicationStatus;

pub type Result<T> = std::result::Result<T, Error>;

const APPLICATION_UNIQUE: &str = "applications_candidate_vacancy_key";
const QUERY_CANCELED: &str = "57014";
const LOCK_NOT_AVAILABLE: &str = "55P03";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Validation error: {0}")]
    InvalidPayload(#[from] validator::ValidationErrors),

    #[error("Score must be an integer between 0 and 10: {field}={value}")]
    InvalidScore { field: &'static str, value: i32 },

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },

    #[error("Candidate already applied to this vacancy")]
    DuplicateApplication,

    #[error("Vacancy is not open for applications")]
    VacancyClosed,

    #[error("Operation timed out")]
    OperationTimeout,

    #[error("Storage failure: {0}")]
    StorageFailure(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Excel export error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable machine-readable kind used in response bodies and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Unauthorized(_) => "unauthenticated",
            Error::PermissionDenied => "permission_denied",
            Error::NotFound(_) => "not_found",
            Error::Validation(_)
            | Error::InvalidPayload(_)
            | Error::Json(_)
            | Error::Multipart(_) => "validation",
            Error::InvalidScore { .. } => "invalid_score",
            Error::InvalidTransition { .. } => "invalid_transition",
            Error::DuplicateApplication => "duplicate_application",
            Error::VacancyClosed => "vacancy_closed",
            Error::OperationTimeout => "operation_timeout",
            Error::StorageFailure(_) => "storage_failure",
            Error::Config(_)
            | Error::Database(_)
            | Error::Xlsx(_)
            | Error::Csv(_)
            | Error::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::PermissionDenied => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Validation(_)
            | Error::InvalidPayload(_)
            | Error::Json(_)
            | Error::Multipart(_)
            | Error::InvalidScore { .. }
            | Error::InvalidTransition { .. }
            | Error::VacancyClosed => StatusCode::BAD_REQUEST,
            Error::DuplicateApplication => StatusCode::CONFLICT,
            Error::OperationTimeout | Error::StorageFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// User-facing message from the closed catalog. Never echoes driver or IO text.
    pub fn message(&self) -> &'static str {
        match self {
            Error::Unauthorized(_) => "Authentication is required.",
            Error::PermissionDenied => "You do not have permission to perform this action.",
            Error::NotFound(_) => "The requested resource was not found.",
            Error::Validation(_)
            | Error::InvalidPayload(_)
            | Error::Json(_)
            | Error::Multipart(_) => "The submitted data is invalid.",
            Error::InvalidScore { .. } => "Scores must be whole numbers between 0 and 10.",
            Error::InvalidTransition { .. } => {
                "This status change is not allowed for the application."
            }
            Error::DuplicateApplication => "You have already applied to this vacancy.",
            Error::VacancyClosed => "This vacancy is not open for applications.",
            Error::OperationTimeout => "The operation took too long. Please try again.",
            Error::StorageFailure(_) => "The file storage is unavailable. Please try again.",
            _ => "An unexpected error occurred.",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "request failed");
        } else {
            tracing::debug!(error = %self, code = self.code(), "request rejected");
        }

        let body = Json(json!({ "error": self.code(), "message": self.message() }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            sqlx::Error::PoolTimedOut => Error::OperationTimeout,
            sqlx::Error::Database(db) => {
                let timed_out = matches!(
                    db.code().as_deref(),
                    Some(QUERY_CANCELED) | Some(LOCK_NOT_AVAILABLE)
                );
                if timed_out {
                    Error::OperationTimeout
                } else if db.constraint() == Some(APPLICATION_UNIQUE) {
                    Error::DuplicateApplication
                } else {
                    Error::Database(sqlx::Error::Database(db))
                }
            }
            other => Error::Database(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_map_to_http_status() {
        assert_eq!(Error::PermissionDenied.status(), StatusCode::FORBIDDEN);
        assert_eq!(Error::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            Error::InvalidScore { field: "technical_score", value: 11 }.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(Error::DuplicateApplication.status(), StatusCode::CONFLICT);
        assert_eq!(Error::VacancyClosed.status(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::OperationTimeout.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            Error::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_messages_do_not_leak_details() {
        let err = Error::Internal("password=hunter2".into());
        assert!(!err.message().contains("hunter2"));
        let err = Error::StorageFailure("/var/uploads: permission denied".into());
        assert!(!err.message().contains("/var/uploads"));
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert_eq!(err.code(), "not_found");
        let err: Error = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.code(), "operation_timeout");
    }
}
