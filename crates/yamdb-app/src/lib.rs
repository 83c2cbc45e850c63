pub mod auth;
pub mod error;
pub mod mail;
pub mod rest_api;
pub mod state;
pub mod user;
pub mod validate;

#[macro_export]
macro_rules! repository_from_request {
    ($repo:ty) => {
        impl axum::extract::FromRequestParts<$crate::state::AppState> for $repo {
            type Rejection = http::StatusCode;

            fn from_request_parts(
                _parts: &mut http::request::Parts,
                state: &$crate::state::AppState,
            ) -> impl std::future::Future<Output = std::result::Result<Self, Self::Rejection>>
                   + core::marker::Send {
                futures::future::ready(std::result::Result::Ok(<$repo>::new(state.pool().clone())))
            }
        }
    };
}

/// All versioned endpoints, to be nested under `/v1`
pub fn api_router() -> axum::Router<state::AppState> {
    axum::Router::new()
        .merge(auth::auth_router())
        .merge(user::router())
        .merge(rest_api::router())
}
