//! # lod2-auth
//!
//! Authentication and authorization core for lod2.
//!
//! ## Modules
//!
//! - `credential`: user records, password verification and changes
//! - `session`: session lifecycle (create, refresh, invalidate)
//! - `rbac`: scope/level role grants and the `has_role` primitive
//! - `invite`: invite codes, quotas and invite-gated registration
//! - `jwt`: RS256 key pair and refresh/access token issuance
//! - `access`: the per-request identity facade used by HTTP handlers
//! - `bootstrap`: the self-healing administrator account

pub mod access;
pub mod bootstrap;
pub mod credential;
pub mod error;
pub mod invite;
pub mod jwt;
pub mod password;
pub mod rbac;
pub mod session;

pub use access::{AccessControl, AuthContext, CookieAction, Identity, IssuedTokens, Resolution};
pub use credential::CredentialStore;
pub use error::{AuthError, AuthResult};
pub use invite::InviteLedger;
pub use jwt::{KeyPair, SignedToken, TokenClaims, TokenService};
pub use password::{PasswordHasher, PasswordValidator};
pub use rbac::{RoleStore, has_role};
pub use session::SessionStore;
