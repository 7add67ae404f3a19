//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use axum::Router;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, SET_COOKIE};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use lod2_api::AppState;
use lod2_auth::KeyPair;
use lod2_auth::bootstrap::ensure_admin;
use lod2_core::config::AppConfig;
use lod2_database::DatabasePool;
use lod2_entity::role::Role;
use lod2_entity::user::User;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-password";

/// One RSA key per test binary; generation dominates test time otherwise.
pub fn test_keys() -> Arc<KeyPair> {
    static KEYS: OnceLock<Arc<KeyPair>> = OnceLock::new();
    KEYS.get_or_init(|| Arc::new(KeyPair::generate().expect("Failed to generate test key")))
        .clone()
}

/// Configuration with a cheap Argon2 cost.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.argon2_memory_kib = 8;
    config.auth.argon2_iterations = 1;
    config.auth.starting_invites = 2;
    config.bootstrap.admin_username = ADMIN_USERNAME.to_string();
    config.bootstrap.admin_password = ADMIN_PASSWORD.to_string();
    config
}

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Fully wired auth core, for direct calls
    pub state: AppState,
    /// The bootstrap administrator
    pub admin: User,
}

impl TestApp {
    /// Create a new test application over a private in-memory database
    pub async fn new() -> Self {
        let db = DatabasePool::connect_in_memory()
            .await
            .expect("Failed to open test database");
        let state = AppState::new(test_config(), db, test_keys()).expect("Failed to build state");

        let admin = ensure_admin(
            &state.credentials,
            &state.roles,
            &state.invites,
            &state.config.bootstrap,
            state.config.auth.starting_invites,
        )
        .await
        .expect("Failed to bootstrap admin");

        Self {
            router: lod2_api::build_router(state.clone()),
            state,
            admin,
        }
    }

    pub fn refresh_cookie_name(&self) -> &str {
        &self.state.config.auth.refresh_cookie_name
    }

    pub fn access_cookie_name(&self) -> &str {
        &self.state.config.auth.access_cookie_name
    }

    /// Create a user directly through the Credential Store
    pub async fn create_user(&self, username: &str, password: &str, roles: &[Role]) -> User {
        self.state
            .credentials
            .create_user(username, password, roles)
            .await
            .expect("Failed to create test user")
    }

    /// Login over HTTP and return the cookies the server set
    pub async fn login(&self, username: &str, password: &str) -> Cookies {
        let response = self
            .request(
                "POST",
                "/auth/login",
                Some(serde_json::json!({
                    "username": username,
                    "password": password,
                })),
                None,
            )
            .await;

        assert_eq!(
            response.status,
            StatusCode::OK,
            "Login failed: {:?}",
            response.body
        );

        Cookies {
            refresh: response.cookie(self.refresh_cookie_name()),
            access: response.cookie(self.access_cookie_name()),
        }
    }

    /// Make an HTTP request to the test app
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        cookies: Option<&Cookies>,
    ) -> TestResponse {
        let body_str = body
            .map(|b| serde_json::to_string(&b).expect("Failed to serialize body"))
            .unwrap_or_default();

        let mut req = Request::builder()
            .method(method)
            .uri(path)
            .header(CONTENT_TYPE, "application/json");

        if let Some(header) = cookies.and_then(|c| c.header(self)) {
            req = req.header(COOKIE, header);
        }

        let req = req
            .body(Body::from(body_str))
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(req)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().expect("Non-ASCII Set-Cookie").to_string())
            .collect();
        let body_bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("Failed to read body");

        let body: Value = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            body,
            set_cookies,
        }
    }
}

/// Token cookies a client holds
#[derive(Debug, Clone, Default)]
pub struct Cookies {
    pub refresh: Option<String>,
    pub access: Option<String>,
}

impl Cookies {
    fn header(&self, app: &TestApp) -> Option<String> {
        let pairs: Vec<String> = [
            (app.refresh_cookie_name(), &self.refresh),
            (app.access_cookie_name(), &self.access),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_ref().map(|v| format!("{name}={v}")))
        .collect();

        (!pairs.is_empty()).then(|| pairs.join("; "))
    }
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    /// HTTP status code
    pub status: StatusCode,
    /// Parsed JSON body
    pub body: Value,
    /// Raw `Set-Cookie` header values
    pub set_cookies: Vec<String>,
}

impl TestResponse {
    /// The raw `Set-Cookie` line for a cookie name
    pub fn set_cookie_line(&self, name: &str) -> Option<&str> {
        self.set_cookies
            .iter()
            .map(String::as_str)
            .find(|line| line.split_once('=').map(|(n, _)| n) == Some(name))
    }

    /// Value set for a cookie, `None` if unset or removed
    pub fn cookie(&self, name: &str) -> Option<String> {
        let line = self.set_cookie_line(name)?;
        if self.cleared(name) {
            return None;
        }
        let (_, rest) = line.split_once('=')?;
        Some(rest.split(';').next().unwrap_or_default().to_string())
    }

    /// Whether the response removes the cookie
    pub fn cleared(&self, name: &str) -> bool {
        self.set_cookie_line(name)
            .is_some_and(|line| line.contains("Max-Age=0"))
    }

    /// `data` of a success envelope
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// `error` code of a failure body
    pub fn error(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}
