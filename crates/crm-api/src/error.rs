//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure renders as `{"message": ...}`, with field detail under
//! `errors` for validation failures and the underlying cause under `error`
//! for server errors.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use crm_core::{
  schema::ValidationErrors,
  store::{ErrorClass, StoreError},
};
use serde_json::json;
use thiserror::Error;

pub const DUPLICATE_EMAIL: &str = "A contact with this email already exists";
pub const CONTACT_NOT_FOUND: &str = "Contact not found";
pub const INVALID_CONTACT_ID: &str = "Invalid contact ID";

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("validation error: {0}")]
  Validation(ValidationErrors),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn contact_not_found() -> Self {
    ApiError::NotFound(CONTACT_NOT_FOUND.to_owned())
  }

  /// Classify a backend failure. Email collisions become 409, schema
  /// violations 400, everything else 500.
  pub fn from_store<E: StoreError>(err: E) -> Self {
    match err.class() {
      ErrorClass::DuplicateEmail => ApiError::Conflict(DUPLICATE_EMAIL.to_owned()),
      ErrorClass::Invalid(errors) => ApiError::Validation(errors.clone()),
      ErrorClass::Other => {
        tracing::warn!(error = %err, "store failure");
        ApiError::Store(Box::new(err))
      }
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

/// A path segment that cannot be decoded is reported like any other bad id.
impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self {
    tracing::debug!(%rejection, "path rejected");
    ApiError::BadRequest(INVALID_CONTACT_ID.to_owned())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, body) = match self {
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, json!({ "message": m })),
      ApiError::Validation(errors) => (
        StatusCode::BAD_REQUEST,
        json!({ "message": "Validation error", "errors": errors }),
      ),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, json!({ "message": m })),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, json!({ "message": m })),
      ApiError::Store(e) => (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "message": "Server error", "error": e.to_string() }),
      ),
    };
    (status, Json(body)).into_response()
  }
}
