//! Invite entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lod2_core::types::{InviteId, UserId};

/// A single-use registration invite.
///
/// Once `consumed_by` is set the invite is spent for good.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invite {
    /// Unique invite identifier, also the invite code.
    pub invite_id: InviteId,
    /// User whose quota this invite belongs to.
    pub created_by: UserId,
    /// User who registered with it.
    pub consumed_by: Option<UserId>,
    /// When the invite was created.
    pub created_at: DateTime<Utc>,
    /// When the invite was consumed.
    pub consumed_at: Option<DateTime<Utc>>,
}

impl Invite {
    pub fn is_consumed(&self) -> bool {
        self.consumed_by.is_some()
    }
}
