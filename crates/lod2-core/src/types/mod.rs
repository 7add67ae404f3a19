//! Shared value types.

pub mod id;

pub use id::{IdParseError, InviteId, SessionId, UserId};
