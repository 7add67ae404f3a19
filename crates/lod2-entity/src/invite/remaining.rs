//! Remaining invite quota.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How many more users someone may invite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "count", rename_all = "snake_case")]
pub enum RemainingInvites {
    /// Holders of User Management Edit are never limited.
    Unlimited,
    /// Number of unconsumed invites the user created.
    Count(u32),
}

impl RemainingInvites {
    /// Whether at least one more invite can be spent.
    pub fn has_any(&self) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Count(n) => *n > 0,
        }
    }
}

impl fmt::Display for RemainingInvites {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unlimited => write!(f, "unlimited"),
            Self::Count(n) => write!(f, "{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_any() {
        assert!(RemainingInvites::Unlimited.has_any());
        assert!(RemainingInvites::Count(1).has_any());
        assert!(!RemainingInvites::Count(0).has_any());
    }

    #[test]
    fn test_serde_is_tagged() {
        let json = serde_json::to_value(RemainingInvites::Count(3)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "count", "count": 3}));
        let json = serde_json::to_value(RemainingInvites::Unlimited).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "unlimited"}));
    }
}
