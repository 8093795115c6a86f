//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use murmur_core::ErrorCode;
use serde::Serialize;
use thiserror::Error;

/// An error returned by a handler or by the access gate.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Domain(#[from] murmur_core::Error),

  /// No identity was attached to a request that needs one.
  #[error("token is missing or invalid")]
  Unauthenticated,
}

impl ApiError {
  pub fn code(&self) -> ErrorCode {
    match self {
      ApiError::Domain(e) => e.code(),
      ApiError::Unauthenticated => ErrorCode::InvalidToken,
    }
  }
}

/// Wire shape of every failed response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
  pub error_code: ErrorCode,
  pub message:    String,
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let code = self.code();
    let status =
      StatusCode::from_u16(code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    // Backend details stay in the log.
    let message = match code {
      ErrorCode::InternalServerError => {
        tracing::error!(error = %self, "request failed");
        code.default_message().to_owned()
      }
      _ => self.to_string(),
    };

    (status, Json(ErrorBody { error_code: code, message })).into_response()
  }
}
