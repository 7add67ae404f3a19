//! Route definitions for the lod2 HTTP API.
//!
//! The router receives `AppState` and passes it to all handlers via Axum's
//! `State` extractor. Every route runs behind the identity middleware.

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = middleware::cors::build_cors_layer(&state.config.server.cors);

    Router::new()
        .merge(health_routes())
        .merge(auth_routes())
        .merge(account_routes())
        .nest("/admin", admin_routes())
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::resolve_identity,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/api/health", get(handlers::health::health))
}

/// Login, logout and invite registration
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        .route(
            "/auth/invite/{code}",
            get(handlers::auth::show_invite).post(handlers::auth::register),
        )
}

/// Signed-in self-service
fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/account", get(handlers::account::me))
        .route("/account/password", put(handlers::account::change_password))
        .route("/account/invite-link", get(handlers::account::invite_link))
        .route("/account/sessions", get(handlers::account::sessions))
}

/// User administration
fn admin_routes() -> Router<AppState> {
    use handlers::admin::users;

    Router::new()
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/users/{id}", get(users::get_user).delete(users::delete_user))
        .route("/users/{id}/sessions", delete(users::invalidate_sessions))
        .route("/users/{id}/invites", put(users::set_invites))
        .route("/users/{id}/roles", put(users::set_roles))
}
