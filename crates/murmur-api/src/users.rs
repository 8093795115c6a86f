//! Handlers for `/users` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/users/join`  | Body: `{"name":"..","password":".."}`; public |
//! | `POST` | `/users/login` | Same body; returns `{"token":".."}`; public |
//! | `GET`  | `/users/alarm` | The caller's alarms, `?page=&size=` |

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::{DateTime, Utc};
use murmur_core::{
  model::{Alarm, AlarmArgs, AlarmId, AlarmKind, Principal},
  page::Page,
  store::{PrincipalStore, SocialStore},
};
use serde::{Deserialize, Serialize};

use crate::{
  AppState,
  auth::Requester,
  error::ApiError,
  response::{Envelope, PageParams, success},
};

#[derive(Debug, Deserialize)]
pub struct CredentialsBody {
  pub name:     String,
  pub password: String,
}

// ─── Join ─────────────────────────────────────────────────────────────────────

/// `POST /users/join`
pub async fn join<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<CredentialsBody>,
) -> Result<Json<Envelope<Principal>>, ApiError>
where
  S: PrincipalStore + SocialStore + 'static,
{
  let principal = state.accounts.join(&body.name, &body.password).await?;
  Ok(success(principal))
}

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct TokenBody {
  pub token: String,
}

/// `POST /users/login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<CredentialsBody>,
) -> Result<Json<Envelope<TokenBody>>, ApiError>
where
  S: PrincipalStore + SocialStore + 'static,
{
  let token = state.accounts.login(&body.name, &body.password).await?;
  Ok(success(TokenBody { token }))
}

// ─── Alarms ───────────────────────────────────────────────────────────────────

/// An alarm as shown to its recipient, with the derived display text.
#[derive(Debug, Serialize)]
pub struct AlarmView {
  pub id:            AlarmId,
  pub kind:          AlarmKind,
  pub args:          AlarmArgs,
  pub text:          &'static str,
  pub registered_at: DateTime<Utc>,
}

impl From<Alarm> for AlarmView {
  fn from(a: Alarm) -> Self {
    Self {
      id:            a.id,
      kind:          a.kind,
      args:          a.args,
      text:          a.kind.text(),
      registered_at: a.registered_at,
    }
  }
}

/// `GET /users/alarm`
pub async fn alarms<S>(
  State(state): State<AppState<S>>,
  Requester(identity): Requester,
  Query(params): Query<PageParams>,
) -> Result<Json<Envelope<Page<AlarmView>>>, ApiError>
where
  S: PrincipalStore + SocialStore + 'static,
{
  let page = state.accounts.alarms(&identity, params.into()).await?;
  Ok(success(page.map(AlarmView::from)))
}
