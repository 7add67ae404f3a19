//! Prefix-tagged identifiers for domain entities.
//!
//! Each identifier wraps a time-ordered UUIDv7 and renders as
//! `<prefix>_<32 hex digits>`, e.g. `user_0190b5c2e1a87c3d9f1e2a4b5c6d7e8f`.
//! Distinct types prevent passing a `SessionId` where a `UserId` is
//! expected. With the `sqlx` feature each type is stored as SQLite TEXT.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

/// Error returned when a string is not a valid identifier of the expected type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {expected} identifier: {value:?}")]
pub struct IdParseError {
    /// Prefix the parser expected.
    pub expected: &'static str,
    /// The rejected input.
    pub value: String,
}

macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident, $prefix:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Uuid);

        impl $name {
            /// Type prefix used in the textual form.
            pub const PREFIX: &'static str = $prefix;

            /// Create a new time-ordered identifier.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner UUID value.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", Self::PREFIX, self.0.simple())
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let err = || IdParseError {
                    expected: Self::PREFIX,
                    value: s.to_string(),
                };
                let rest = s
                    .strip_prefix(Self::PREFIX)
                    .and_then(|r| r.strip_prefix('_'))
                    .ok_or_else(err)?;
                Uuid::try_parse(rest).map(Self).map_err(|_| err())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }

        #[cfg(feature = "sqlx")]
        impl sqlx::Type<sqlx::Sqlite> for $name {
            fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
                <String as sqlx::Type<sqlx::Sqlite>>::type_info()
            }

            fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
            }
        }

        #[cfg(feature = "sqlx")]
        impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut <sqlx::Sqlite as sqlx::Database>::ArgumentBuffer<'q>,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <String as sqlx::Encode<'q, sqlx::Sqlite>>::encode(self.to_string(), buf)
            }
        }

        #[cfg(feature = "sqlx")]
        impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for $name {
            fn decode(
                value: <sqlx::Sqlite as sqlx::Database>::ValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let s = <&str as sqlx::Decode<'r, sqlx::Sqlite>>::decode(value)?;
                Ok(s.parse()?)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a user.
    UserId, "user"
);

define_id!(
    /// Unique identifier for a login session. Used as the refresh token subject.
    SessionId, "session"
);

define_id!(
    /// Unique identifier for an invite. Doubles as the invite code.
    InviteId, "inv"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_parse_roundtrip() {
        let id = UserId::new();
        let text = id.to_string();
        assert!(text.starts_with("user_"));
        assert_eq!(text.len(), "user_".len() + 32);
        assert_eq!(text.parse::<UserId>(), Ok(id));
    }

    #[test]
    fn test_wrong_prefix_rejected() {
        let session = SessionId::new().to_string();
        let err = session.parse::<UserId>().unwrap_err();
        assert_eq!(err.expected, "user");

        assert!("inv_abc".parse::<InviteId>().is_err());
        assert!("inv".parse::<InviteId>().is_err());
        assert!("".parse::<InviteId>().is_err());
    }

    #[test]
    fn test_ids_are_time_ordered() {
        let first = InviteId::new();
        let second = InviteId::new();
        assert!(first < second);
        assert!(first.to_string() < second.to_string());
    }

    #[test]
    fn test_serde_uses_text_form() {
        let id = SessionId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: SessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
