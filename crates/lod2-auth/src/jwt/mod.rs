//! Signed bearer tokens.

pub mod claims;
pub mod keys;
pub mod service;

pub use claims::{AUDIENCE_ACCESS, AUDIENCE_REFRESH, SignedToken, TokenClaims};
pub use keys::KeyPair;
pub use service::TokenService;
