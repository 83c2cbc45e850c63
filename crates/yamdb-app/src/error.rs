use std::collections::BTreeMap;

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    response::{IntoResponse, Response},
    Json,
};
use http::{header, StatusCode};
use serde::Serialize;
use tracing::{debug, error};
use yamdb_types::policy::Denial;

pub type ApiResult<T, E = ApiError> = std::result::Result<T, E>;

pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Validation messages keyed by the offending field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let mut field = field.into();
        if field.is_empty() {
            field = NON_FIELD_ERRORS.to_string();
        }
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(|v| v.as_slice())
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{field}: {}", messages.join(", "))?;
        }
        Ok(())
    }
}

impl From<garde::Report> for FieldErrors {
    fn from(report: garde::Report) -> Self {
        let mut errors = FieldErrors::new();
        for (path, error) in report.iter() {
            errors.add(path.to_string(), error.message());
        }
        errors
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid input: {0}")]
    Validation(FieldErrors),
    #[error("Authentication credentials were not provided or are invalid")]
    Unauthenticated,
    #[error("You do not have permission to perform this action")]
    Forbidden,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::Validation(FieldErrors::single(field, message))
    }
}

#[derive(Serialize)]
struct Detail<'a> {
    detail: &'a str,
}

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(Detail { detail: message })).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            ApiError::Unauthenticated => {
                let mut response = detail(StatusCode::UNAUTHORIZED, &self.to_string());
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    http::HeaderValue::from_static("Bearer"),
                );
                response
            }
            ApiError::Forbidden => detail(StatusCode::FORBIDDEN, &self.to_string()),
            ApiError::NotFound(ref what) => {
                debug!("Not found: {what}");
                detail(StatusCode::NOT_FOUND, "Not found")
            }
            ApiError::Internal(cause) => {
                error!("Internal error: {cause}");
                detail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl From<yamdb_dal::Error> for ApiError {
    fn from(value: yamdb_dal::Error) -> Self {
        use yamdb_dal::Error;
        match value {
            Error::RecordNotFound(what) | Error::ReferenceNotFound(what) => ApiError::NotFound(what),
            Error::UniqueViolation { field } => {
                let message = format!("Record with this {field} already exists");
                if field.contains(',') {
                    ApiError::field(NON_FIELD_ERRORS, message)
                } else {
                    ApiError::field(field, message)
                }
            }
            e @ Error::DuplicateReview => ApiError::field(NON_FIELD_ERRORS, e.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<Denial> for ApiError {
    fn from(value: Denial) -> Self {
        match value {
            Denial::Unauthenticated => ApiError::Unauthenticated,
            Denial::Forbidden => ApiError::Forbidden,
        }
    }
}

impl From<yamdb_auth::Error> for ApiError {
    fn from(value: yamdb_auth::Error) -> Self {
        ApiError::Internal(value.to_string())
    }
}

impl From<crate::mail::MailError> for ApiError {
    fn from(value: crate::mail::MailError) -> Self {
        ApiError::Internal(value.to_string())
    }
}

impl From<garde::Report> for ApiError {
    fn from(value: garde::Report) -> Self {
        ApiError::Validation(value.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        ApiError::field(NON_FIELD_ERRORS, value.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(value: QueryRejection) -> Self {
        ApiError::field(NON_FIELD_ERRORS, value.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(value: PathRejection) -> Self {
        ApiError::NotFound(value.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors() {
        let mut errors = FieldErrors::single("", "Broken");
        errors.add("score", "Too high");
        errors.add("score", "Not a number");
        assert_eq!(Some(&["Broken".to_string()][..]), errors.get(NON_FIELD_ERRORS));
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            serde_json::json!({"non_field_errors": ["Broken"], "score": ["Too high", "Not a number"]}),
            json
        );
    }

    #[test]
    fn test_dal_error_mapping() {
        let err: ApiError = yamdb_dal::Error::UniqueViolation {
            field: "email".to_string(),
        }
        .into();
        match err {
            ApiError::Validation(errors) => assert!(errors.get("email").is_some()),
            other => panic!("Unexpected error {other:?}"),
        }

        let err: ApiError = yamdb_dal::Error::ReferenceNotFound("Genre x".to_string()).into();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err: ApiError = yamdb_dal::Error::DuplicateReview.into();
        assert_eq!(
            StatusCode::BAD_REQUEST,
            err.into_response().status()
        );
    }

    #[test]
    fn test_denial_status() {
        let response = ApiError::from(Denial::Unauthenticated).into_response();
        assert_eq!(StatusCode::UNAUTHORIZED, response.status());
        assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
        let response = ApiError::from(Denial::Forbidden).into_response();
        assert_eq!(StatusCode::FORBIDDEN, response.status());
    }
}
