//! Repository implementations for all lod2 tables.
//!
//! Methods that take a `&mut SqliteConnection` are meant to be composed
//! inside a transaction; the rest run directly against the pool.

pub mod invite;
pub mod role;
pub mod session;
pub mod user;

pub use invite::InviteRepository;
pub use role::RoleRepository;
pub use session::SessionRepository;
pub use user::UserRepository;
