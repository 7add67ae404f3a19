//! Identity extractors backed by the context the auth middleware stored.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use lod2_auth::{AuthContext, AuthError, Identity};
use lod2_core::types::UserId;

use crate::error::ApiError;

/// The request's authentication state, possibly anonymous.
#[derive(Debug, Clone)]
pub struct Auth(pub AuthContext);

impl<S: Send + Sync> FromRequestParts<S> for Auth {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<AuthContext>()
                .cloned()
                .unwrap_or_default(),
        ))
    }
}

/// A signed-in caller. Rejects anonymous requests with 401.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub identity: Identity,
    pub context: AuthContext,
}

impl CurrentUser {
    pub fn user_id(&self) -> UserId {
        self.identity.user_id
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Auth(context) = Auth::from_request_parts(parts, state).await?;
        let identity = context
            .identity()
            .cloned()
            .ok_or(ApiError(AuthError::NotAuthenticated))?;
        Ok(Self { identity, context })
    }
}
