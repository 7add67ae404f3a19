//! Scope/level role-based access control.

pub mod enforcer;
pub mod store;

pub use enforcer::{effective_level, has_role};
pub use store::RoleStore;
