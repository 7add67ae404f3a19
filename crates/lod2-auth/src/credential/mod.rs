//! User records and password credentials.

pub mod store;

pub use store::CredentialStore;
