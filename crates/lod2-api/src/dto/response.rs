//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lod2_core::types::{InviteId, SessionId, UserId};
use lod2_entity::invite::RemainingInvites;
use lod2_entity::role::{AccessLevel, AccessScope, Role};
use lod2_entity::session::SessionListing;
use lod2_entity::user::User;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Health check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

/// Returned after login or registration. Tokens travel in cookies only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: UserId,
    pub username: String,
    pub session_id: SessionId,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_expires_at: DateTime<Utc>,
}

/// One grant with its display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleResponse {
    pub scope: AccessScope,
    pub level: AccessLevel,
    pub name: String,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            scope: role.scope,
            level: role.level,
            name: role.display_name(),
        }
    }
}

/// Public account fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub user_id: UserId,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.user_id,
            username: user.username,
            created_at: user.created_at,
        }
    }
}

/// The signed-in user's own account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub user: UserResponse,
    pub session_id: SessionId,
    pub roles: Vec<RoleResponse>,
    pub remaining_invites: RemainingInvites,
    pub invited_by: Option<String>,
}

/// Administrative view of one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDetailResponse {
    pub user: UserResponse,
    pub roles: Vec<RoleResponse>,
    pub sessions: Vec<SessionListing>,
    pub remaining_invites: RemainingInvites,
    pub invited_by: Option<String>,
}

/// Shareable invite link of the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteLinkResponse {
    pub code: Option<InviteId>,
    pub url: Option<String>,
    pub remaining: RemainingInvites,
}

/// Details shown on an invite landing page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InviteResponse {
    pub code: InviteId,
    pub invited_by: String,
}

/// Result of a bulk session invalidation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidatedResponse {
    pub invalidated: u64,
}
