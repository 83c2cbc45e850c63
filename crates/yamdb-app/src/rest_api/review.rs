use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json,
};
use axum_extra::extract::WithRejection;
use garde::Validate as _;
use http::StatusCode;
use tracing::debug;
use yamdb_dal::review::{CreateReview, ReviewRepository, UpdateReview};
use yamdb_types::policy::{Action, Actor, Resource};

use crate::{
    auth::require_identity,
    error::ApiResult,
    repository_from_request,
    rest_api::{Page, Paging},
    state::AppState,
    validate::{ApiJson, Garde},
};

repository_from_request!(ReviewRepository);

pub async fn list(
    Garde(Query(paging)): Garde<Query<Paging>>,
    Path(title_id): Path<i64>,
    State(state): State<AppState>,
    repository: ReviewRepository,
) -> ApiResult<impl IntoResponse> {
    let page_size = paging.page_size(state.config().default_page_size);
    let batch = repository
        .list_for_title(title_id, paging.into_listing_params(page_size))
        .await?;
    Ok(Json(Page::from_batch(batch, page_size)))
}

pub async fn get_review(
    Path((title_id, id)): Path<(i64, i64)>,
    repository: ReviewRepository,
) -> ApiResult<impl IntoResponse> {
    let review = repository.get(title_id, id).await?;
    Ok(Json(review))
}

pub async fn create(
    Path(title_id): Path<i64>,
    actor: Actor,
    repository: ReviewRepository,
    WithRejection(Json(payload), _): ApiJson<CreateReview>,
) -> ApiResult<impl IntoResponse> {
    actor.authorize(Action::Create, Resource::Review, None)?;
    let author = require_identity(&actor)?;
    payload.validate()?;
    let review = repository.create(title_id, author.id, payload).await?;
    debug!("Review {} on title {title_id} by {}", review.id, author.username);
    Ok((StatusCode::CREATED, Json(review)))
}

pub async fn update(
    Path((title_id, id)): Path<(i64, i64)>,
    actor: Actor,
    repository: ReviewRepository,
    WithRejection(Json(payload), _): ApiJson<UpdateReview>,
) -> ApiResult<impl IntoResponse> {
    require_identity(&actor)?;
    let review = repository.get(title_id, id).await?;
    actor.authorize(Action::Update, Resource::Review, Some(review.author_id))?;
    payload.validate()?;
    let review = repository.update(title_id, id, payload).await?;
    Ok(Json(review))
}

pub async fn delete(
    Path((title_id, id)): Path<(i64, i64)>,
    actor: Actor,
    repository: ReviewRepository,
) -> ApiResult<impl IntoResponse> {
    require_identity(&actor)?;
    let review = repository.get(title_id, id).await?;
    actor.authorize(Action::Delete, Resource::Review, Some(review.author_id))?;
    repository.delete(title_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/titles/{title_id}/reviews/", get(list).post(create))
        .route(
            "/titles/{title_id}/reviews/{review_id}/",
            get(get_review).patch(update).delete(delete),
        )
}
