//! Auth handlers: login, logout, invite landing and registration.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum_extra::extract::cookie::CookieJar;
use validator::Validate;

use lod2_auth::{AuthError, Identity, IssuedTokens};

use crate::dto::request::{LoginRequest, RegisterRequest};
use crate::dto::response::{ApiResponse, InviteResponse, LoginResponse, MessageResponse};
use crate::error::ApiError;
use crate::state::AppState;

fn login_response(tokens: &IssuedTokens) -> Result<LoginResponse, ApiError> {
    let identity = Identity::from_access_claims(&tokens.access.claims)
        .ok_or(ApiError(AuthError::MalformedToken("access token without identity")))?;
    Ok(LoginResponse {
        user_id: identity.user_id,
        username: identity.username,
        session_id: identity.session_id,
        access_expires_at: tokens.access.expires_at(),
        refresh_expires_at: tokens.refresh.expires_at(),
    })
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<LoginResponse>>), ApiError> {
    req.validate()?;

    let tokens = state.access.login(&req.username, &req.password).await?;
    let body = login_response(&tokens)?;
    let jar = state.cookies.set_tokens(jar, &tokens);

    Ok((jar, Json(ApiResponse::ok(body))))
}

/// POST /auth/logout
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<ApiResponse<MessageResponse>>) {
    let (refresh, _) = state.cookies.read(&jar);
    state.access.sign_out(refresh.as_deref()).await;

    (
        state.cookies.clear(jar),
        Json(ApiResponse::ok(MessageResponse::new("Signed out"))),
    )
}

/// GET /auth/invite/{code}
pub async fn show_invite(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<InviteResponse>>, ApiError> {
    let inviter_id = state.invites.validate_invite_code(&code).await?;
    let inviter = state.credentials.get_user(inviter_id).await?;
    let code = code
        .parse()
        .map_err(|_| ApiError(AuthError::InvalidOrExpiredInvite))?;

    Ok(Json(ApiResponse::ok(InviteResponse {
        code,
        invited_by: inviter.username,
    })))
}

/// POST /auth/invite/{code}
///
/// Registers the account and signs it in.
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(code): Path<String>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, CookieJar, Json<ApiResponse<LoginResponse>>), ApiError> {
    req.validate()?;
    if req.password != req.password_confirm {
        return Err(AuthError::PasswordMismatch.into());
    }

    let user = state
        .invites
        .register_with_invite(&code, &req.username, &req.password)
        .await?;

    let tokens = state.access.login_as(&user).await?;
    let body = login_response(&tokens)?;
    let jar = state.cookies.set_tokens(jar, &tokens);

    Ok((StatusCode::CREATED, jar, Json(ApiResponse::ok(body))))
}
