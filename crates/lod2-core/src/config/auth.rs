//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Token, cookie, invite and credential configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// `iss` claim written into and required from every token.
    #[serde(default = "default_issuer")]
    pub issuer: String,
    /// PEM file holding the RSA signing key. Generated on first run.
    #[serde(default = "default_private_key_path")]
    pub private_key_path: String,
    /// Access token lifetime in seconds.
    #[serde(default = "default_access_ttl")]
    pub access_token_ttl_seconds: u64,
    /// Refresh token (and session) lifetime in days.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_token_ttl_days: u64,
    /// Clock skew tolerated when checking `exp`.
    #[serde(default = "default_leeway")]
    pub clock_leeway_seconds: u64,
    /// Name of the refresh token cookie.
    #[serde(default = "default_refresh_cookie")]
    pub refresh_cookie_name: String,
    /// Name of the access token cookie.
    #[serde(default = "default_access_cookie")]
    pub access_cookie_name: String,
    /// Whether token cookies carry the `Secure` attribute.
    #[serde(default = "default_true")]
    pub cookie_secure: bool,
    /// Invites granted to a newly registered user.
    #[serde(default = "default_starting_invites")]
    pub starting_invites: u32,
    /// Minimum password length.
    #[serde(default = "default_password_min")]
    pub password_min_length: usize,
    /// Maximum password length.
    #[serde(default = "default_password_max")]
    pub password_max_length: usize,
    /// Argon2 memory cost in KiB.
    #[serde(default = "default_argon2_memory")]
    pub argon2_memory_kib: u32,
    /// Argon2 iteration count.
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,
    /// Argon2 lane count.
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: default_issuer(),
            private_key_path: default_private_key_path(),
            access_token_ttl_seconds: default_access_ttl(),
            refresh_token_ttl_days: default_refresh_ttl(),
            clock_leeway_seconds: default_leeway(),
            refresh_cookie_name: default_refresh_cookie(),
            access_cookie_name: default_access_cookie(),
            cookie_secure: default_true(),
            starting_invites: default_starting_invites(),
            password_min_length: default_password_min(),
            password_max_length: default_password_max(),
            argon2_memory_kib: default_argon2_memory(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
        }
    }
}

/// The distinguished administrator account ensured at every startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// Username of the bootstrap account.
    #[serde(default = "default_admin_username")]
    pub admin_username: String,
    /// Password used only when the account is first created.
    #[serde(default = "default_admin_password")]
    pub admin_password: String,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            admin_username: default_admin_username(),
            admin_password: default_admin_password(),
        }
    }
}

fn default_issuer() -> String {
    "https://lod2.zip".to_string()
}

fn default_private_key_path() -> String {
    "config/keys/auth/private.pem".to_string()
}

fn default_access_ttl() -> u64 {
    15 * 60
}

fn default_refresh_ttl() -> u64 {
    183
}

fn default_leeway() -> u64 {
    5
}

fn default_refresh_cookie() -> String {
    "lod2.refresh".to_string()
}

fn default_access_cookie() -> String {
    "lod2.access".to_string()
}

fn default_true() -> bool {
    true
}

fn default_starting_invites() -> u32 {
    5
}

fn default_password_min() -> usize {
    1
}

fn default_password_max() -> usize {
    256
}

fn default_argon2_memory() -> u32 {
    19 * 1024
}

fn default_argon2_iterations() -> u32 {
    2
}

fn default_argon2_parallelism() -> u32 {
    1
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_password() -> String {
    "admin".to_string()
}
