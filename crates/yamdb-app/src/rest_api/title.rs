use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json,
};
use axum_extra::extract::WithRejection;
use garde::Validate as _;
use http::StatusCode;
use yamdb_dal::title::{CreateTitle, TitleFilter, TitleRepository, UpdateTitle};
use yamdb_types::policy::{Action, Actor, Resource};

use crate::{
    error::ApiResult,
    repository_from_request,
    rest_api::{Page, Paging},
    state::AppState,
    validate::{ApiJson, Garde},
};

repository_from_request!(TitleRepository);

pub async fn list(
    Garde(Query(paging)): Garde<Query<Paging>>,
    Garde(Query(filter)): Garde<Query<TitleFilter>>,
    State(state): State<AppState>,
    repository: TitleRepository,
) -> ApiResult<impl IntoResponse> {
    let page_size = paging.page_size(state.config().default_page_size);
    let batch = repository
        .list(paging.into_listing_params(page_size), &filter)
        .await?;
    Ok(Json(Page::from_batch(batch, page_size)))
}

pub async fn get_title(
    Path(id): Path<i64>,
    repository: TitleRepository,
) -> ApiResult<impl IntoResponse> {
    let title = repository.get(id).await?;
    Ok(Json(title))
}

pub async fn create(
    actor: Actor,
    repository: TitleRepository,
    WithRejection(Json(payload), _): ApiJson<CreateTitle>,
) -> ApiResult<impl IntoResponse> {
    actor.authorize(Action::Create, Resource::Title, None)?;
    payload.validate()?;
    let title = repository.create(payload).await?;
    Ok((StatusCode::CREATED, Json(title)))
}

pub async fn update(
    Path(id): Path<i64>,
    actor: Actor,
    repository: TitleRepository,
    WithRejection(Json(payload), _): ApiJson<UpdateTitle>,
) -> ApiResult<impl IntoResponse> {
    actor.authorize(Action::Update, Resource::Title, None)?;
    payload.validate()?;
    let title = repository.update(id, payload).await?;
    Ok(Json(title))
}

pub async fn delete(
    Path(id): Path<i64>,
    actor: Actor,
    repository: TitleRepository,
) -> ApiResult<impl IntoResponse> {
    actor.authorize(Action::Delete, Resource::Title, None)?;
    repository.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .route("/titles/", get(list).post(create))
        .route(
            "/titles/{title_id}/",
            get(get_title).patch(update).delete(delete),
        )
}
