//! Bearer-token authenticator and the [`Requester`] extractor.
//!
//! The authenticator only annotates: a missing, malformed, expired, or
//! unresolvable token leaves the request unauthenticated and it is the
//! [gate](crate::gate) that turns that into a 401.

use axum::{
  extract::{FromRequestParts, Request, State},
  http::{HeaderMap, header, request::Parts},
  middleware::Next,
  response::Response,
};
use murmur_core::{ErrorCode, identity::Identity, store::PrincipalStore};
use tracing::{error, warn};

use crate::{AppState, error::ApiError};

/// The token carried by `Authorization: Bearer <token>`, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

/// Middleware: attach the caller's [`Identity`] to the request extensions
/// when the bearer token verifies and its subject resolves.
pub async fn authenticate<S>(
  State(state): State<AppState<S>>,
  mut req: Request,
  next: Next,
) -> Response
where
  S: PrincipalStore + 'static,
{
  if let Some(token) = bearer_token(req.headers()).map(str::to_owned) {
    match state.accounts.authenticate(&token).await {
      Ok(identity) => {
        req.extensions_mut().insert(identity);
      }
      Err(e) if is_backend_failure(&e) => {
        error!(error = %e, path = %req.uri().path(), "could not resolve bearer token")
      }
      Err(e) => warn!(error = %e, path = %req.uri().path(), "bearer token rejected"),
    }
  }
  next.run(req).await
}

/// Store or credential failures, as opposed to a token that is simply bad.
fn is_backend_failure(e: &murmur_core::Error) -> bool {
  e.code() == ErrorCode::InternalServerError
}

/// The authenticated caller. Rejects with `INVALID_TOKEN` when the
/// authenticator attached nothing.
#[derive(Debug, Clone)]
pub struct Requester(pub Identity);

impl<St> FromRequestParts<St> for Requester
where
  St: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<Identity>()
      .cloned()
      .map(Requester)
      .ok_or(ApiError::Unauthenticated)
  }
}
