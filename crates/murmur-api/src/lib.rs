//! JSON REST API for Murmur.
//!
//! Exposes an axum [`Router`] backed by any store implementing both
//! [`PrincipalStore`] and [`SocialStore`]. Every request first passes the
//! [authenticator](auth::authenticate), then the [access gate](gate::enforce).
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = murmur_api::api_router(AppState::new(store, tokens, ttl));
//! axum::serve(listener, app).await?;
//! ```

pub mod auth;
pub mod error;
pub mod gate;
pub mod posts;
pub mod response;
pub mod users;

use std::sync::Arc;

use axum::{
  Router, middleware,
  routing::{delete, get, post, put},
};
use chrono::Duration;
use murmur_core::{
  account::AccountService,
  service::FeedService,
  store::{PrincipalStore, SocialStore},
  token::TokenCodec,
};
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use gate::GatePolicy;

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through the middleware and every handler.
pub struct AppState<S> {
  pub feed:     FeedService<S>,
  pub accounts: AccountService<S>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { feed: self.feed.clone(), accounts: self.accounts.clone() }
  }
}

impl<S> AppState<S>
where
  S: PrincipalStore + SocialStore,
{
  pub fn new(store: Arc<S>, tokens: Arc<TokenCodec>, token_ttl: Duration) -> Self {
    Self {
      feed:     FeedService::new(Arc::clone(&store)),
      accounts: AccountService::new(store, tokens, token_ttl),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router: `/api/v1/...` plus an ungated
/// `/health` probe.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: PrincipalStore + SocialStore + 'static,
{
  let v1 = Router::new()
    // Users
    .route("/users/join", post(users::join::<S>))
    .route("/users/login", post(users::login::<S>))
    .route("/users/alarm", get(users::alarms::<S>))
    // Posts
    .route("/posts", get(posts::list::<S>).post(posts::create::<S>))
    .route("/posts/my", get(posts::mine::<S>))
    .route("/posts/{id}", put(posts::modify::<S>).delete(posts::delete::<S>))
    .route("/posts/{id}/likes", get(posts::like_count::<S>).post(posts::like::<S>))
    .route("/posts/{id}/comments", get(posts::comments::<S>).post(posts::comment::<S>))
    .route("/posts/{id}/comments/{comment_id}", delete(posts::delete_comment::<S>));

  Router::new()
    .route("/health", get(health))
    .nest("/api/v1", v1)
    .layer(middleware::from_fn_with_state(GatePolicy::default(), gate::enforce))
    .layer(middleware::from_fn_with_state(state.clone(), auth::authenticate::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

async fn health() -> &'static str { "ok" }

// ─── Integration tests ────────────────────────────────────────────────────────
