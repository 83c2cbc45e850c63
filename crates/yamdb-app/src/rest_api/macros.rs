/// Endpoints for records addressed by slug: public search list, admin create and delete
#[macro_export]
macro_rules! slug_api {
    ($entity:ident, $create:ty, $repository:ty, $path:literal) => {
        $crate::repository_from_request!($repository);

        pub mod slug_api {
            use super::*;
            use $crate::error::ApiResult;
            use $crate::rest_api::{Page, Paging, SearchParams};
            use $crate::state::AppState;
            use $crate::validate::{ApiJson, Garde};
            use axum::{
                extract::{Path, Query, State},
                response::IntoResponse,
                Json,
            };
            use axum_extra::extract::WithRejection;
            use garde::Validate as _;
            use http::StatusCode;
            use yamdb_types::policy::{Action, Actor, Resource};

            pub async fn list(
                Garde(Query(paging)): Garde<Query<Paging>>,
                Garde(Query(search)): Garde<Query<SearchParams>>,
                State(state): State<AppState>,
                repository: $repository,
            ) -> ApiResult<impl IntoResponse> {
                let page_size = paging.page_size(state.config().default_page_size);
                let batch = repository
                    .list(
                        paging.into_listing_params(page_size),
                        search.search.as_deref(),
                    )
                    .await?;
                Ok(Json(Page::from_batch(batch, page_size)))
            }

            pub async fn create(
                actor: Actor,
                repository: $repository,
                WithRejection(Json(payload), _): ApiJson<$create>,
            ) -> ApiResult<impl IntoResponse> {
                actor.authorize(Action::Create, Resource::$entity, None)?;
                payload.validate()?;
                let record = repository.create(payload).await?;

                Ok((StatusCode::CREATED, Json(record)))
            }

            pub async fn delete(
                Path(slug): Path<String>,
                actor: Actor,
                repository: $repository,
            ) -> ApiResult<impl IntoResponse> {
                actor.authorize(Action::Delete, Resource::$entity, None)?;
                repository.delete(&slug).await?;

                Ok(StatusCode::NO_CONTENT)
            }
        }

        pub fn router() -> axum::Router<$crate::state::AppState> {
            use axum::routing::{delete, get};
            axum::Router::new()
                .route(
                    concat!($path, "/"),
                    get(slug_api::list).post(slug_api::create),
                )
                .route(concat!($path, "/{slug}/"), delete(slug_api::delete))
        }
    };
}
