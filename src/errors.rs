use actix_identity::error::{GetIdentityError, LoginError};
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use sqlx::Error as SqlxError;
use thiserror::Error;

/// Domain error taxonomy. Every operation returns one of these kinds;
/// the single mapping to an HTTP status and a JSON `{"error": ...}`
/// payload lives in the `ResponseError` impl below.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Not enough seats available. Only {remaining} seats remaining")]
    InsufficientSeats { remaining: i64 },

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("Session error: {0}")]
    Identity(#[from] GetIdentityError),

    #[error("Session error: {0}")]
    Login(#[from] LoginError),

    #[error("Password hashing error: {0}")]
    Password(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::BAD_REQUEST,
            AppError::InsufficientSeats { .. } => StatusCode::BAD_REQUEST,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Identity(_) => StatusCode::UNAUTHORIZED,
            AppError::Login(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Password(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

impl From<AppError> for std::io::Error {
    fn from(err: AppError) -> Self {
        std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Unauthenticated("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InsufficientSeats { remaining: 3 }.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn insufficient_seats_reports_the_remaining_count() {
        let err = AppError::InsufficientSeats { remaining: 7 };
        assert_eq!(
            err.to_string(),
            "Not enough seats available. Only 7 seats remaining"
        );
    }
}
