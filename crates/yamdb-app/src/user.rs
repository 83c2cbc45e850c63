use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json,
};
use axum_extra::extract::WithRejection;
use garde::Validate as _;
use http::StatusCode;
use tracing::{debug, info};
use yamdb_dal::user::{CreateUser, UpdateProfile, UpdateUser, UserRepository};
use yamdb_types::policy::{may_assign_role, Action, Actor, Resource};

use crate::{
    auth::require_identity,
    error::ApiResult,
    repository_from_request,
    rest_api::{Page, Paging},
    state::AppState,
    validate::{ApiJson, Garde},
};

repository_from_request!(UserRepository);

fn admin_only(actor: &Actor, action: Action) -> ApiResult<()> {
    actor.authorize(action, Resource::User, None)?;
    Ok(())
}

pub async fn list_users(
    Garde(Query(paging)): Garde<Query<Paging>>,
    State(state): State<AppState>,
    actor: Actor,
    users: UserRepository,
) -> ApiResult<impl IntoResponse> {
    admin_only(&actor, Action::Read)?;
    let page_size = paging.page_size(state.config().default_page_size);
    let batch = users.list(paging.into_listing_params(page_size)).await?;
    Ok(Json(Page::from_batch(batch, page_size)))
}

pub async fn create_user(
    actor: Actor,
    users: UserRepository,
    WithRejection(Json(payload), _): ApiJson<CreateUser>,
) -> ApiResult<impl IntoResponse> {
    admin_only(&actor, Action::Create)?;
    payload.validate()?;
    let user = users.create(payload).await?;
    info!("User {} created with role {}", user.username, user.role);
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    Path(username): Path<String>,
    actor: Actor,
    users: UserRepository,
) -> ApiResult<impl IntoResponse> {
    admin_only(&actor, Action::Read)?;
    let user = users.find_by_username(&username).await?;
    Ok(Json(user))
}

pub async fn update_user(
    Path(username): Path<String>,
    actor: Actor,
    users: UserRepository,
    WithRejection(Json(payload), _): ApiJson<UpdateUser>,
) -> ApiResult<impl IntoResponse> {
    admin_only(&actor, Action::Update)?;
    payload.validate()?;
    let user = users.find_by_username(&username).await?;
    let user = users.update(user.id, payload).await?;
    Ok(Json(user))
}

pub async fn delete_user(
    Path(username): Path<String>,
    actor: Actor,
    users: UserRepository,
) -> ApiResult<impl IntoResponse> {
    admin_only(&actor, Action::Delete)?;
    let user = users.find_by_username(&username).await?;
    users.delete(user.id).await?;
    info!("User {username} deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_me(actor: Actor, users: UserRepository) -> ApiResult<impl IntoResponse> {
    actor.authorize(Action::Read, Resource::OwnProfile, None)?;
    let identity = require_identity(&actor)?;
    let user = users.get(identity.id).await?;
    Ok(Json(user))
}

/// Own profile update, role cannot be changed here and is silently dropped
pub async fn update_me(
    actor: Actor,
    users: UserRepository,
    WithRejection(Json(profile), _): ApiJson<UpdateProfile>,
) -> ApiResult<impl IntoResponse> {
    actor.authorize(Action::Update, Resource::OwnProfile, None)?;
    let identity = require_identity(&actor)?;
    if profile.has_role() && !may_assign_role(&actor, Resource::OwnProfile) {
        debug!("Ignoring role in profile update of {}", identity.username);
    }
    let payload = UpdateUser::from(profile);
    payload.validate()?;
    let user = users.update(identity.id, payload).await?;
    Ok(Json(user))
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/users/", get(list_users).post(create_user))
        .route("/users/me/", get(get_me).patch(update_me))
        .route(
            "/users/{username}/",
            get(get_user).patch(update_user).delete(delete_user),
        )
}
