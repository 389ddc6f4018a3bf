//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The reading came from a device the server is not configured for.
  #[error("unknown device: {0}")]
  UnknownDevice(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The store did not answer in time.
  #[error("service unavailable: {0}")]
  Unavailable(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<roomwatch_core::Error> for ApiError {
  fn from(e: roomwatch_core::Error) -> Self {
    use roomwatch_core::Error as E;
    if !e.is_transient() {
      return match e {
        E::UnknownDevice(location) => ApiError::UnknownDevice(format!(
          "location {location:?} is not a configured device"
        )),
        other => ApiError::BadRequest(other.to_string()),
      };
    }
    match e {
      E::Timeout { .. } => ApiError::Unavailable(e.to_string()),
      other => ApiError::Store(Box::new(other)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::UnknownDevice(m) => (StatusCode::UNPROCESSABLE_ENTITY, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Unavailable(m) => (StatusCode::SERVICE_UNAVAILABLE, m.clone()),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "request failed on store error");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
