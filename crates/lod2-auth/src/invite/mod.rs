//! Invite codes and invite-gated registration.

pub mod ledger;
pub mod link;

pub use ledger::InviteLedger;
pub use link::invite_url;
