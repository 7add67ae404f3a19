//! Admin user management handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use tracing::info;
use validator::Validate;

use lod2_auth::AuthError;
use lod2_auth::bootstrap::is_bootstrap_admin;
use lod2_core::types::UserId;
use lod2_entity::role::{AccessLevel, AccessScope, Role};
use lod2_entity::user::UserSummary;

use crate::dto::request::{CreateUserRequest, SetInvitesQuery, SetRolesRequest};
use crate::dto::response::{
    ApiResponse, InvalidatedResponse, MessageResponse, RoleResponse, UserDetailResponse,
    UserResponse,
};
use crate::error::ApiError;
use crate::extractors::CurrentUser;
use crate::handlers::account::inviter_name;
use crate::state::AppState;

async fn require(state: &AppState, current: &CurrentUser, level: AccessLevel) -> Result<(), ApiError> {
    state
        .access
        .require_role(&current.context, AccessScope::UserManagement, level)
        .await?;
    Ok(())
}

/// GET /admin/users
pub async fn list_users(
    State(state): State<AppState>,
    current: CurrentUser,
) -> Result<Json<ApiResponse<Vec<UserSummary>>>, ApiError> {
    require(&state, &current, AccessLevel::View).await?;
    let users = state.credentials.list_users().await?;
    Ok(Json(ApiResponse::ok(users)))
}

/// POST /admin/users
pub async fn create_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    require(&state, &current, AccessLevel::Edit).await?;
    req.validate()?;

    let user = state
        .invites
        .invite_user(current.user_id(), &req.username, &req.password)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::ok(user.into()))))
}

/// GET /admin/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<UserId>,
) -> Result<Json<ApiResponse<UserDetailResponse>>, ApiError> {
    require(&state, &current, AccessLevel::View).await?;

    let user = state.credentials.get_active_user(id).await?;
    let roles = state.roles.get_roles(id).await?;
    let sessions = state.sessions.list_for_user(id).await?;
    let remaining_invites = state.invites.remaining_invites(id).await?;
    let invited_by = inviter_name(&state, &user).await?;

    Ok(Json(ApiResponse::ok(UserDetailResponse {
        user: user.into(),
        roles: roles.into_iter().map(RoleResponse::from).collect(),
        sessions,
        remaining_invites,
        invited_by,
    })))
}

/// DELETE /admin/users/{id}/sessions
pub async fn invalidate_sessions(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<UserId>,
) -> Result<Json<ApiResponse<InvalidatedResponse>>, ApiError> {
    require(&state, &current, AccessLevel::Edit).await?;
    state.credentials.get_active_user(id).await?;

    let invalidated = state.sessions.invalidate_all_for_user(id).await?;
    info!(admin = %current.user_id(), user_id = %id, invalidated, "Admin signed user out everywhere");

    Ok(Json(ApiResponse::ok(InvalidatedResponse { invalidated })))
}

/// PUT /admin/users/{id}/invites?to=N
pub async fn set_invites(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<UserId>,
    Query(query): Query<SetInvitesQuery>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    require(&state, &current, AccessLevel::Edit).await?;
    state.credentials.get_active_user(id).await?;

    state.invites.set_remaining_invites(id, query.to).await?;

    Ok(Json(ApiResponse::ok(MessageResponse::new(format!(
        "Remaining invites set to {}",
        query.to
    )))))
}

/// PUT /admin/users/{id}/roles
pub async fn set_roles(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<UserId>,
    Json(req): Json<SetRolesRequest>,
) -> Result<Json<ApiResponse<Vec<RoleResponse>>>, ApiError> {
    require(&state, &current, AccessLevel::Edit).await?;
    state.credentials.get_active_user(id).await?;

    let grants: Vec<Role> = req
        .roles
        .iter()
        .map(|(scope, level)| Role::new(*scope, *level))
        .collect();
    state.roles.set_roles(id, &grants).await?;
    info!(admin = %current.user_id(), user_id = %id, "Admin updated roles");

    let roles = state.roles.get_roles(id).await?;
    Ok(Json(ApiResponse::ok(
        roles.into_iter().map(RoleResponse::from).collect(),
    )))
}

/// DELETE /admin/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(id): Path<UserId>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    require(&state, &current, AccessLevel::Edit).await?;

    let user = state.credentials.get_active_user(id).await?;
    if is_bootstrap_admin(&user, &state.config.bootstrap) {
        return Err(AuthError::Validation(
            "The bootstrap administrator cannot be deleted".to_string(),
        )
        .into());
    }

    state.credentials.delete_user(id, &state.sessions).await?;
    info!(admin = %current.user_id(), user_id = %id, "Admin deleted user");

    Ok(Json(ApiResponse::ok(MessageResponse::new("User deleted"))))
}
