//! Session entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lod2_core::types::{SessionId, UserId};

/// One authenticated login.
///
/// A session is valid while `expires_at` lies in the future. Logout and
/// administrative force-logout set `expires_at` to the current time; rows
/// are never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier (refresh token subject).
    pub session_id: SessionId,
    /// The user this session belongs to.
    pub user_id: UserId,
    /// When the session was created (login time).
    pub issued_at: DateTime<Utc>,
    /// Last time an access token was minted from this session.
    pub refreshed_at: DateTime<Utc>,
    /// Absolute expiry. Never extended.
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session is valid at the given instant.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }

    /// Whether the session has expired or been invalidated.
    pub fn is_expired(&self) -> bool {
        !self.is_valid_at(Utc::now())
    }

    /// Builds the display form with the derived `expired` flag.
    pub fn listing(&self, now: DateTime<Utc>) -> SessionListing {
        SessionListing {
            session_id: self.session_id,
            issued_at: self.issued_at,
            refreshed_at: self.refreshed_at,
            expires_at: self.expires_at,
            expired: !self.is_valid_at(now),
        }
    }
}

/// Session row as shown in account and admin views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionListing {
    pub session_id: SessionId,
    pub issued_at: DateTime<Utc>,
    pub refreshed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub expired: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(expires_in: Duration) -> Session {
        let now = Utc::now();
        Session {
            session_id: SessionId::new(),
            user_id: UserId::new(),
            issued_at: now,
            refreshed_at: now,
            expires_at: now + expires_in,
        }
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let s = session(Duration::zero());
        assert!(!s.is_valid_at(s.expires_at));
        assert!(s.is_valid_at(s.expires_at - Duration::milliseconds(1)));
    }

    #[test]
    fn test_listing_derives_expired_flag() {
        let live = session(Duration::days(1));
        assert!(!live.listing(Utc::now()).expired);

        let dead = session(Duration::days(-1));
        assert!(dead.listing(Utc::now()).expired);
        assert!(dead.is_expired());
    }
}
