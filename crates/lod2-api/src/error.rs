//! Maps domain errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use lod2_auth::AuthError;
use lod2_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// Error returned by every handler.
#[derive(Debug)]
pub struct ApiError(pub AuthError);

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(err)
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(AuthError::Internal(err))
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self(AuthError::Validation(err.to_string()))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            AuthError::InvalidUsername
            | AuthError::InvalidPassword
            | AuthError::InvalidSession
            | AuthError::MalformedToken(_)
            | AuthError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            AuthError::Unauthorized => StatusCode::FORBIDDEN,
            AuthError::DuplicateUsername(_) => StatusCode::CONFLICT,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::Validation(_)
            | AuthError::InvalidOrExpiredInvite
            | AuthError::NoInvitesRemaining
            | AuthError::PasswordMismatch
            | AuthError::InvalidCurrentPassword => StatusCode::BAD_REQUEST,
            AuthError::Internal(e) => match e.kind {
                ErrorKind::NotFound => StatusCode::NOT_FOUND,
                ErrorKind::Conflict => StatusCode::CONFLICT,
                ErrorKind::Validation => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "Internal server error");
        }

        let body = ApiErrorResponse {
            error: self.0.code().to_string(),
            message: self.0.public_message(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError(AuthError::InvalidPassword).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError(AuthError::Unauthorized).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError(AuthError::DuplicateUsername("bob".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(AppError::database("locked")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
