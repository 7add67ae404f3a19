//! User entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lod2_core::types::{InviteId, UserId};

/// A registered user account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier.
    pub user_id: UserId,
    /// Unique login name. Overwritten with a tombstone on deletion.
    pub username: String,
    /// Argon2 PHC-format password hash.
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// Soft-delete flag. Deleted users cannot log in.
    pub deleted: bool,
    /// The invite this user registered with, if any.
    pub invite_id: Option<InviteId>,
}

impl User {
    /// Check if the user can log in.
    pub fn can_login(&self) -> bool {
        !self.deleted
    }
}

/// Data required to create a new user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Identifier assigned to the new row.
    pub user_id: UserId,
    /// Desired username.
    pub username: String,
    /// Pre-hashed password.
    pub password_hash: String,
    /// Invite the user registered with.
    pub invite_id: Option<InviteId>,
}

/// One row of the administrative user listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    /// Unique user identifier.
    pub user_id: UserId,
    /// Username.
    pub username: String,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// Most recent session issue time, if the user ever logged in.
    pub last_login: Option<DateTime<Utc>>,
    /// Number of sessions that have not expired.
    pub active_sessions: i64,
}
