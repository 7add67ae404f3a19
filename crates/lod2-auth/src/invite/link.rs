//! Shareable invite links.

use lod2_core::types::InviteId;

/// Builds the registration URL for an invite code.
///
/// Local hosts get plain `http`, everything else `https`.
pub fn invite_url(host: &str, code: InviteId) -> String {
    let hostname = host.split(':').next().unwrap_or(host);
    let scheme = if hostname == "localhost" || hostname == "127.0.0.1" {
        "http"
    } else {
        "https"
    };
    format!("{scheme}://{host}/auth/invite/{code}")
}
