//! Request-facing access control.

pub mod context;
pub mod control;

pub use context::{AuthContext, Identity};
pub use control::{AccessControl, CookieAction, IssuedTokens, Resolution};
