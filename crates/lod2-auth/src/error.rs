//! Domain error taxonomy for authentication and authorization.

use thiserror::Error;

use lod2_core::error::{AppError, ErrorKind};

/// Result alias for the auth core.
pub type AuthResult<T> = Result<T, AuthError>;

/// Failures surfaced by the credential, session, role, invite and token layers.
///
/// `InvalidUsername` and `InvalidPassword` stay distinct for logging; callers
/// that talk to the network use [`AuthError::public_message`], which merges
/// them.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no active user with that username")]
    InvalidUsername,

    #[error("password does not match")]
    InvalidPassword,

    #[error("username '{0}' is already taken")]
    DuplicateUsername(String),

    #[error("session is expired or unknown")]
    InvalidSession,

    #[error("malformed token: {0}")]
    MalformedToken(&'static str),

    #[error("invite code is invalid or already used")]
    InvalidOrExpiredInvite,

    #[error("no invites remaining")]
    NoInvitesRemaining,

    #[error("new password and confirmation differ")]
    PasswordMismatch,

    #[error("current password is incorrect")]
    InvalidCurrentPassword,

    #[error("not signed in")]
    NotAuthenticated,

    #[error("insufficient role")]
    Unauthorized,

    #[error("user not found")]
    UserNotFound,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Internal(#[from] AppError),
}

impl AuthError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidUsername | Self::InvalidPassword => "INVALID_CREDENTIALS",
            Self::DuplicateUsername(_) => "DUPLICATE_USERNAME",
            Self::InvalidSession => "INVALID_SESSION",
            Self::MalformedToken(_) => "MALFORMED_TOKEN",
            Self::InvalidOrExpiredInvite => "INVALID_OR_EXPIRED_INVITE",
            Self::NoInvitesRemaining => "NO_INVITES_REMAINING",
            Self::PasswordMismatch => "PASSWORD_MISMATCH",
            Self::InvalidCurrentPassword => "INVALID_CURRENT_PASSWORD",
            Self::NotAuthenticated => "NOT_AUTHENTICATED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::UserNotFound => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION",
            Self::Internal(e) if e.is(ErrorKind::NotFound) => "NOT_FOUND",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Message that is safe to show to an unauthenticated client.
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidUsername | Self::InvalidPassword => {
                "Invalid username or password".to_string()
            }
            Self::MalformedToken(_) | Self::InvalidSession => {
                "Your session has ended, please sign in again".to_string()
            }
            Self::Internal(e) if e.is(ErrorKind::NotFound) => "Not found".to_string(),
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether this failure reflects a storage or crypto fault rather than
    /// a caller mistake.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(e) if !e.is(ErrorKind::NotFound))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_failures_are_indistinguishable() {
        let unknown = AuthError::InvalidUsername;
        let wrong = AuthError::InvalidPassword;
        assert_eq!(unknown.code(), wrong.code());
        assert_eq!(unknown.public_message(), wrong.public_message());
        assert_ne!(unknown.to_string(), wrong.to_string());
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let err = AuthError::from(AppError::database("disk I/O error at page 7"));
        assert!(err.is_internal());
        assert_eq!(err.code(), "INTERNAL");
        assert!(!err.public_message().contains("disk"));
    }
}
