use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json,
};
use axum_extra::extract::WithRejection;
use garde::Validate as _;
use http::StatusCode;
use yamdb_dal::comment::{CommentRepository, CreateComment, UpdateComment};
use yamdb_types::policy::{Action, Actor, Resource};

use crate::{
    auth::require_identity,
    error::ApiResult,
    repository_from_request,
    rest_api::{Page, Paging},
    state::AppState,
    validate::{ApiJson, Garde},
};

repository_from_request!(CommentRepository);

pub async fn list(
    Garde(Query(paging)): Garde<Query<Paging>>,
    Path((title_id, review_id)): Path<(i64, i64)>,
    State(state): State<AppState>,
    repository: CommentRepository,
) -> ApiResult<impl IntoResponse> {
    let page_size = paging.page_size(state.config().default_page_size);
    let batch = repository
        .list_for_review(title_id, review_id, paging.into_listing_params(page_size))
        .await?;
    Ok(Json(Page::from_batch(batch, page_size)))
}

pub async fn get_comment(
    Path((title_id, review_id, id)): Path<(i64, i64, i64)>,
    repository: CommentRepository,
) -> ApiResult<impl IntoResponse> {
    let comment = repository.get(title_id, review_id, id).await?;
    Ok(Json(comment))
}

pub async fn create(
    Path((title_id, review_id)): Path<(i64, i64)>,
    actor: Actor,
    repository: CommentRepository,
    WithRejection(Json(payload), _): ApiJson<CreateComment>,
) -> ApiResult<impl IntoResponse> {
    actor.authorize(Action::Create, Resource::Comment, None)?;
    let author = require_identity(&actor)?;
    payload.validate()?;
    let comment = repository
        .create(title_id, review_id, author.id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn update(
    Path((title_id, review_id, id)): Path<(i64, i64, i64)>,
    actor: Actor,
    repository: CommentRepository,
    WithRejection(Json(payload), _): ApiJson<UpdateComment>,
) -> ApiResult<impl IntoResponse> {
    require_identity(&actor)?;
    let comment = repository.get(title_id, review_id, id).await?;
    actor.authorize(Action::Update, Resource::Comment, Some(comment.author_id))?;
    payload.validate()?;
    let comment = repository.update(title_id, review_id, id, payload).await?;
    Ok(Json(comment))
}

pub async fn delete(
    Path((title_id, review_id, id)): Path<(i64, i64, i64)>,
    actor: Actor,
    repository: CommentRepository,
) -> ApiResult<impl IntoResponse> {
    require_identity(&actor)?;
    let comment = repository.get(title_id, review_id, id).await?;
    actor.authorize(Action::Delete, Resource::Comment, Some(comment.author_id))?;
    repository.delete(title_id, review_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/",
            get(list).post(create),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/{comment_id}/",
            get(get_comment).patch(update).delete(delete),
        )
}
