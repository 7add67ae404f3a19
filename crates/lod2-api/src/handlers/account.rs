//! Self-service account handlers.

use axum::Json;
use axum::extract::State;
use validator::Validate;

use lod2_auth::invite::invite_url;
use lod2_entity::invite::RemainingInvites;
use lod2_entity::session::SessionListing;
use lod2_entity::user::User;

use crate::dto::request::ChangePasswordRequest;
use crate::dto::response::{
    AccountResponse, ApiResponse, InviteLinkResponse, MessageResponse, RoleResponse,
};
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::state::AppState;

/// Username of whoever invited `user`.
pub(crate) async fn inviter_name(state: &AppState, user: &User) -> Result<Option<String>, ApiError> {
    let Some(inviter_id) = state.invites.inviter_of(user).await? else {
        return Ok(None);
    };
    Ok(Some(state.credentials.get_user(inviter_id).await?.username))
}

/// GET /account
pub async fn me(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<ApiResponse<AccountResponse>>, ApiError> {
    let user = state.credentials.get_active_user(current.user_id()).await?;
    let roles = state.roles.get_roles(user.user_id).await?;
    let remaining_invites = state.invites.remaining_invites(user.user_id).await?;
    let invited_by = inviter_name(&state, &user).await?;

    Ok(Json(ApiResponse::ok(AccountResponse {
        user: user.into(),
        session_id: current.identity.session_id,
        roles: roles.into_iter().map(RoleResponse::from).collect(),
        remaining_invites,
        invited_by,
    })))
}

/// PUT /account/password
pub async fn change_password(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    req.validate()?;
    state
        .credentials
        .change_password(
            current.user_id(),
            &req.current_password,
            &req.new_password,
            &req.new_password_confirm,
        )
        .await?;

    Ok(Json(ApiResponse::ok(MessageResponse::new("Password changed"))))
}

/// GET /account/invite-link
///
/// Unlimited inviters with no spare invite get one minted.
pub async fn invite_link(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<ApiResponse<InviteLinkResponse>>, ApiError> {
    let user_id = current.user_id();
    let remaining = state.invites.remaining_invites(user_id).await?;

    let code = match state.invites.first_unused_invite(user_id).await? {
        Some(code) => Some(code),
        None if remaining == RemainingInvites::Unlimited => {
            Some(state.invites.create_invite(user_id).await?)
        }
        None => None,
    };
    let url = code.map(|code| invite_url(&state.config.server.public_host, code));

    Ok(Json(ApiResponse::ok(InviteLinkResponse {
        code,
        url,
        remaining,
    })))
}

/// GET /account/sessions
pub async fn sessions(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<ApiResponse<Vec<SessionListing>>>, ApiError> {
    let sessions = state.sessions.list_for_user(current.user_id()).await?;
    Ok(Json(ApiResponse::ok(sessions)))
}
