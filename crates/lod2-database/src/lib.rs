//! # lod2-database
//!
//! SQLite connection management, the versioned schema migrations, and
//! concrete repositories for users, sessions, role grants and invites.

pub mod connection;
pub mod migration;
pub mod repositories;
mod timestamp;

pub use connection::DatabasePool;
