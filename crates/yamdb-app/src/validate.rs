use std::ops::{Deref, DerefMut};

use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    Json,
};
use axum_extra::extract::WithRejection;
use garde::Validate;
use http::request::Parts;

use crate::{error::ApiError, state::AppState};

/// Extracts inner value and validates it, rejecting with 400 and field errors
#[derive(Debug, Clone, Copy, Default)]
pub struct Garde<E>(pub E);

impl<E> Deref for Garde<E> {
    type Target = E;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<E> DerefMut for Garde<E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<Extractor, T> FromRequest<AppState> for Garde<Extractor>
where
    T: Validate<Context = ()>,
    Extractor: Deref<Target = T> + FromRequest<AppState>,
    ApiError: From<<Extractor as FromRequest<AppState>>::Rejection>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let inner = Extractor::from_request(req, state).await?;
        inner.deref().validate()?;
        Ok(Garde(inner))
    }
}

impl<Extractor, T> FromRequestParts<AppState> for Garde<Extractor>
where
    T: Validate<Context = ()>,
    Extractor: Deref<Target = T> + FromRequestParts<AppState>,
    ApiError: From<<Extractor as FromRequestParts<AppState>>::Rejection>,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let inner = Extractor::from_request_parts(parts, state).await?;
        inner.deref().validate()?;
        Ok(Garde(inner))
    }
}

/// JSON body that is validated later, after authorization, rejecting malformed input with 400
pub type ApiJson<T> = WithRejection<Json<T>, ApiError>;
