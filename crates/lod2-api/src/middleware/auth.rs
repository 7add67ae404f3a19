//! Per-request identity resolution from the token cookies.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;

use crate::state::AppState;

/// Resolves the cookie pair, stores the `AuthContext` in request
/// extensions, and applies the resulting cookie action to the response.
///
/// Handlers that set a token cookie themselves (login, logout,
/// registration) take precedence over the action.
pub async fn resolve_identity(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let (refresh, access) = state.cookies.read(&jar);
    let resolution = state
        .access
        .resolve(refresh.as_deref(), access.as_deref())
        .await;

    request.extensions_mut().insert(resolution.context);
    let response = next.run(request).await;

    if state.cookies.touched_by(response.headers()) {
        return response;
    }
    (state.cookies.apply(jar, &resolution.cookies), response).into_response()
}
