use axum::{extract::FromRequestParts, RequestPartsExt};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use http::{header::AUTHORIZATION, request::Parts};
use tracing::debug;
use yamdb_dal::{user::UserRepository, Error as DalError};
use yamdb_types::policy::{Actor, Identity};

use crate::{error::ApiError, state::AppState};

/// Resolves who is calling.
///
/// Requests without `Authorization` header are anonymous. A token that does not
/// validate, or whose user no longer exists, is rejected with 401. Role is always
/// taken from the stored user, not from the token.
impl FromRequestParts<AppState> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(AUTHORIZATION) {
            return Ok(Actor::Anonymous);
        }

        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|e| {
                debug!("Invalid authorization header: {e}");
                ApiError::Unauthenticated
            })?;

        let claim = state
            .tokens()
            .validate(bearer.token())
            .map_err(|e| {
                debug!("Failed to validate token: {e}");
                ApiError::Unauthenticated
            })?;
        let user_id = claim.user_id().ok_or_else(|| {
            debug!("Token subject {} is not user id", claim.sub);
            ApiError::Unauthenticated
        })?;

        let user = UserRepository::new(state.pool().clone())
            .get(user_id)
            .await
            .map_err(|e| match e {
                DalError::RecordNotFound(_) => {
                    debug!("Token for unknown user {user_id}");
                    ApiError::Unauthenticated
                }
                other => other.into(),
            })?;

        Ok(Actor::User(Identity {
            id: user.id,
            username: user.username,
            role: user.role,
        }))
    }
}

/// Identity of an actor that must be authenticated
pub fn require_identity(actor: &Actor) -> Result<&Identity, ApiError> {
    actor.identity().ok_or(ApiError::Unauthenticated)
}
