//! API response wrapper and domain error mapping

use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::error;

use fpms_core::DomainError;

#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
    pub timestamp: String,
}

#[derive(Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn error(code: &str, message: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.to_string(),
                message: message.to_string(),
            }),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

pub type ErrorResponse = (StatusCode, Json<ApiResponse<()>>);

/// Maps domain errors to client-facing responses. Validation problems are
/// shown inline; auth problems stay generic so accounts cannot be
/// enumerated; everything systemic becomes an opaque 500 with full detail
/// only in the server log.
pub fn domain_error(err: DomainError) -> ErrorResponse {
    match err {
        DomainError::ValidationError(msg) | DomainError::PasswordRejected(msg) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("VALIDATION_ERROR", &msg)),
        ),
        DomainError::OfficeNotFound(code) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(
                "VALIDATION_ERROR",
                &format!("Unknown office: {code}"),
            )),
        ),
        DomainError::UsernameAlreadyExists(username) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(
                "VALIDATION_ERROR",
                &format!("Username already exists: {username}"),
            )),
        ),
        DomainError::PasswordRecentlyUsed => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(
                "VALIDATION_ERROR",
                "Password was used recently",
            )),
        ),
        DomainError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::error("AUTH_ERROR", "Invalid username or password")),
        ),
        DomainError::AccountLocked => (
            StatusCode::LOCKED,
            Json(ApiResponse::error(
                "ACCOUNT_LOCKED",
                "Account temporarily locked, try again later",
            )),
        ),
        DomainError::SessionExpired | DomainError::InvalidSession => (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::error("AUTH_ERROR", "Session expired or invalid")),
        ),
        DomainError::PermissionDenied => (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("PERMISSION_DENIED", "Not authorized")),
        ),
        DomainError::UserNotFound => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("NOT_FOUND", "User not found")),
        ),
        err => {
            error!("Internal error serving request: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error("SYSTEM_ERROR", "An internal error occurred")),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_are_generic() {
        let (status, body) = domain_error(DomainError::InvalidCredentials);
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body.0.error.as_ref().unwrap().message, "Invalid username or password");
    }

    #[test]
    fn test_system_errors_hide_detail() {
        let (status, body) = domain_error(DomainError::DatabaseError(
            "connection refused at 10.0.0.5:5432".to_string(),
        ));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let message = &body.0.error.as_ref().unwrap().message;
        assert!(!message.contains("10.0.0.5"));
    }

    #[test]
    fn test_permission_denied_is_403() {
        let (status, _) = domain_error(DomainError::PermissionDenied);
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}
