use garde::Validate;
use serde::Deserialize;

use crate::state::AppState;

pub mod category;
pub mod comment;
pub mod genre;
mod macros;
pub mod paging;
pub mod review;
pub mod title;

pub use paging::{Page, Paging};

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct SearchParams {
    #[garde(length(max = 256))]
    pub search: Option<String>,
}

pub fn router() -> axum::Router<AppState> {
    axum::Router::new()
        .merge(category::router())
        .merge(genre::router())
        .merge(title::router())
        .merge(review::router())
        .merge(comment::router())
}
