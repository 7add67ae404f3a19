//! Invite domain entities.

pub mod model;
pub mod remaining;

pub use model::Invite;
pub use remaining::RemainingInvites;
