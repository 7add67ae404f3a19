//! Request DTOs with validation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use lod2_entity::role::{AccessLevel, AccessScope};

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Self-service registration with an invite code.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    pub password_confirm: String,
}

/// Password change request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    pub new_password: String,
    pub new_password_confirm: String,
}

/// Create user request (admin). Spends one of the caller's invites.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Role update. Scopes left out are unchanged; `none` revokes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetRolesRequest {
    pub roles: BTreeMap<AccessScope, AccessLevel>,
}

/// `?to=N` on the invite quota endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetInvitesQuery {
    pub to: u32,
}
