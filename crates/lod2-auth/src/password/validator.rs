//! Username and password policy checks.

use lod2_core::config::AuthConfig;

use crate::error::{AuthError, AuthResult};

/// Longest accepted username, in characters.
pub const MAX_USERNAME_LEN: usize = 64;

/// Prefix reserved for the usernames of deleted accounts.
pub const TOMBSTONE_PREFIX: &str = "deleted-";

/// Enforces length limits on new credentials.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    min_length: usize,
    max_length: usize,
}

impl PasswordValidator {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length.max(1),
            max_length: config.password_max_length,
        }
    }

    /// Checks a new password against the length policy.
    pub fn validate_password(&self, password: &str) -> AuthResult<()> {
        let len = password.chars().count();
        if len < self.min_length {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters",
                self.min_length
            )));
        }
        if len > self.max_length {
            return Err(AuthError::Validation(format!(
                "Password must be at most {} characters",
                self.max_length
            )));
        }
        Ok(())
    }

    /// Checks a new username: non-empty, no surrounding or control
    /// whitespace, bounded length, not in the tombstone namespace.
    pub fn validate_username(&self, username: &str) -> AuthResult<()> {
        if username.is_empty() {
            return Err(AuthError::Validation("Username is required".to_string()));
        }
        if username.chars().count() > MAX_USERNAME_LEN {
            return Err(AuthError::Validation(format!(
                "Username must be at most {MAX_USERNAME_LEN} characters"
            )));
        }
        if username.trim() != username || username.chars().any(char::is_control) {
            return Err(AuthError::Validation(
                "Username must not contain leading, trailing or control whitespace".to_string(),
            ));
        }
        if username.starts_with(TOMBSTONE_PREFIX) {
            return Err(AuthError::Validation(format!(
                "Usernames starting with '{TOMBSTONE_PREFIX}' are reserved"
            )));
        }
        Ok(())
    }
}
