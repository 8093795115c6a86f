//! The access gate: decides, per request, whether an identity is required.
//!
//! Runs after [`crate::auth::authenticate`]. Paths outside the API prefix
//! are not gated at all; this keeps health checks reachable and is a
//! routing decision, not a security boundary.

use axum::{
  extract::{Request, State},
  http::Method,
  middleware::Next,
  response::{IntoResponse, Response},
};
use murmur_core::identity::Identity;

use crate::error::ApiError;

/// How a request is treated by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
  /// Outside the API prefix.
  Ungated,
  /// Inside the prefix but open to anyone.
  Public,
  /// Needs an attached [`Identity`].
  Protected,
}

/// Path policy. The version segment directly after `prefix` is a wildcard,
/// so `/api/v1/users/join` and `/api/v2/users/join` are both public.
#[derive(Debug, Clone)]
pub struct GatePolicy {
  prefix: &'static str,
  public: &'static [(Method, &'static str)],
}

const PUBLIC_ROUTES: &[(Method, &str)] =
  &[(Method::POST, "users/join"), (Method::POST, "users/login")];

impl Default for GatePolicy {
  fn default() -> Self { Self { prefix: "/api", public: PUBLIC_ROUTES } }
}

impl GatePolicy {
  pub fn classify(&self, method: &Method, path: &str) -> Access {
    let Some(rest) = path.strip_prefix(self.prefix) else {
      return Access::Ungated;
    };
    let Some(rest) = rest.strip_prefix('/') else {
      return if rest.is_empty() { Access::Protected } else { Access::Ungated };
    };

    // Skip the version segment.
    let tail = rest.split_once('/').map_or("", |(_, tail)| tail);
    let is_public = self
      .public
      .iter()
      .any(|(m, p)| m == method && *p == tail);

    if is_public { Access::Public } else { Access::Protected }
  }
}

/// Middleware: reject protected requests that carry no identity.
pub async fn enforce(State(policy): State<GatePolicy>, req: Request, next: Next) -> Response {
  let access = policy.classify(req.method(), req.uri().path());
  if access == Access::Protected && req.extensions().get::<Identity>().is_none() {
    return ApiError::Unauthenticated.into_response();
  }
  next.run(req).await
}
