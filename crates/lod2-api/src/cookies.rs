//! Delivery of refresh and access tokens as HTTP-only cookies.

use axum::http::HeaderMap;
use axum::http::header::SET_COOKIE;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;

use lod2_auth::{CookieAction, IssuedTokens, SignedToken};
use lod2_core::config::AuthConfig;

/// Cookie names and transport flags.
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub refresh_name: String,
    pub access_name: String,
    pub secure: bool,
}

impl CookieSettings {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            refresh_name: config.refresh_cookie_name.clone(),
            access_name: config.access_cookie_name.clone(),
            secure: config.cookie_secure,
        }
    }

    /// The raw `(refresh, access)` token values presented by the client.
    pub fn read(&self, jar: &CookieJar) -> (Option<String>, Option<String>) {
        let value = |name: &str| jar.get(name).map(|c| c.value().to_string());
        (value(&self.refresh_name), value(&self.access_name))
    }

    fn token_cookie(&self, name: &str, token: &SignedToken) -> Cookie<'static> {
        let max_age = token.claims.remaining_seconds(Utc::now());
        Cookie::build((name.to_string(), token.token.clone()))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .max_age(time::Duration::seconds(max_age))
            .build()
    }

    fn removal(name: &str) -> Cookie<'static> {
        Cookie::build((name.to_string(), "")).path("/").build()
    }

    /// Adds both cookies of a fresh login.
    pub fn set_tokens(&self, jar: CookieJar, tokens: &IssuedTokens) -> CookieJar {
        jar.add(self.token_cookie(&self.refresh_name, &tokens.refresh))
            .add(self.token_cookie(&self.access_name, &tokens.access))
    }

    pub fn set_access(&self, jar: CookieJar, token: &SignedToken) -> CookieJar {
        jar.add(self.token_cookie(&self.access_name, token))
    }

    /// Removes both cookies. Only cookies the client sent produce a header.
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        jar.remove(Self::removal(&self.refresh_name))
            .remove(Self::removal(&self.access_name))
    }

    /// Applies a resolution's cookie action to a request's jar.
    pub fn apply(&self, jar: CookieJar, action: &CookieAction) -> CookieJar {
        match action {
            CookieAction::Keep => jar,
            CookieAction::SetAccess(token) => self.set_access(jar, token),
            CookieAction::Clear => self.clear(jar),
        }
    }

    /// Whether a response already sets either token cookie.
    pub fn touched_by(&self, headers: &HeaderMap) -> bool {
        headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| value.split_once('=').map(|(name, _)| name.trim()))
            .any(|name| name == self.refresh_name || name == self.access_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use lod2_auth::TokenClaims;

    fn settings() -> CookieSettings {
        CookieSettings::from_config(&AuthConfig::default())
    }

    fn token(exp_in: i64) -> SignedToken {
        let now = Utc::now().timestamp();
        SignedToken {
            token: "header.payload.signature".into(),
            claims: TokenClaims {
                iss: "https://lod2.zip".into(),
                iat: now,
                exp: now + exp_in,
                sub: None,
                aud: None,
                username: None,
                sid: None,
                roles: None,
            },
        }
    }

    #[test]
    fn test_token_cookie_flags() {
        let s = settings();
        let cookie = s.token_cookie(&s.access_name, &token(900));

        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.path(), Some("/"));
        let max_age = cookie.max_age().unwrap().whole_seconds();
        assert!((899..=900).contains(&max_age));
    }

    #[test]
    fn test_touched_by_matches_exact_names() {
        let s = settings();
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("other=1; Path=/"));
        assert!(!s.touched_by(&headers));

        headers.append(
            SET_COOKIE,
            HeaderValue::from_str(&format!("{}=; Max-Age=0", s.refresh_name)).unwrap(),
        );
        assert!(s.touched_by(&headers));
    }

    #[test]
    fn test_clear_only_emits_presented_cookies() {
        let s = settings();
        let jar = CookieJar::new().add(Cookie::new(s.access_name.clone(), "stale"));
        let jar = s.clear(jar);
        assert!(jar.get(&s.access_name).is_none());
        assert!(jar.get(&s.refresh_name).is_none());
    }
}
