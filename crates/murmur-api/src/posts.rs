//! Handlers for `/posts` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/posts` | Body: `{"title":"..","body":".."}` |
//! | `GET`    | `/posts` | All live posts, `?page=&size=` |
//! | `GET`    | `/posts/my` | The caller's posts |
//! | `PUT`    | `/posts/:id` | Owner only; returns the updated post |
//! | `DELETE` | `/posts/:id` | Owner only; cascades to likes and comments |
//! | `POST`   | `/posts/:id/likes` | At most one live like per caller |
//! | `GET`    | `/posts/:id/likes` | Live like count |
//! | `POST`   | `/posts/:id/comments` | Body: `{"comment":".."}` |
//! | `GET`    | `/posts/:id/comments` | Paged |
//! | `DELETE` | `/posts/:id/comments/:comment_id` | Author only |

use axum::{
  Json,
  extract::{Path, Query, State},
};
use murmur_core::{
  model::{Comment, CommentId, Like, Post, PostId},
  page::Page,
  store::{PrincipalStore, SocialStore},
};
use serde::Deserialize;

use crate::{
  AppState,
  auth::Requester,
  error::ApiError,
  response::{Envelope, PageParams, success},
};

#[derive(Debug, Deserialize)]
pub struct PostBody {
  pub title: String,
  pub body:  String,
}

#[derive(Debug, Deserialize)]
pub struct CommentBody {
  pub comment: String,
}

// ─── Posts ────────────────────────────────────────────────────────────────────

/// `POST /posts`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Requester(identity): Requester,
  Json(body): Json<PostBody>,
) -> Result<Json<Envelope<Post>>, ApiError>
where
  S: PrincipalStore + SocialStore + 'static,
{
  let post = state.feed.create_post(&identity, body.title, body.body).await?;
  Ok(success(post))
}

/// `GET /posts`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<PageParams>,
) -> Result<Json<Envelope<Page<Post>>>, ApiError>
where
  S: PrincipalStore + SocialStore + 'static,
{
  Ok(success(state.feed.list_posts(params.into()).await?))
}

/// `GET /posts/my`
pub async fn mine<S>(
  State(state): State<AppState<S>>,
  Requester(identity): Requester,
  Query(params): Query<PageParams>,
) -> Result<Json<Envelope<Page<Post>>>, ApiError>
where
  S: PrincipalStore + SocialStore + 'static,
{
  Ok(success(state.feed.list_my_posts(&identity, params.into()).await?))
}

/// `PUT /posts/:id`
pub async fn modify<S>(
  State(state): State<AppState<S>>,
  Requester(identity): Requester,
  Path(id): Path<PostId>,
  Json(body): Json<PostBody>,
) -> Result<Json<Envelope<Post>>, ApiError>
where
  S: PrincipalStore + SocialStore + 'static,
{
  let post = state
    .feed
    .modify_post(&identity, id, body.title, body.body)
    .await?;
  Ok(success(post))
}

/// `DELETE /posts/:id`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  Requester(identity): Requester,
  Path(id): Path<PostId>,
) -> Result<Json<Envelope<()>>, ApiError>
where
  S: PrincipalStore + SocialStore + 'static,
{
  state.feed.delete_post(&identity, id).await?;
  Ok(success(()))
}

// ─── Likes ────────────────────────────────────────────────────────────────────

/// `POST /posts/:id/likes`
pub async fn like<S>(
  State(state): State<AppState<S>>,
  Requester(identity): Requester,
  Path(id): Path<PostId>,
) -> Result<Json<Envelope<Like>>, ApiError>
where
  S: PrincipalStore + SocialStore + 'static,
{
  Ok(success(state.feed.like_post(&identity, id).await?))
}

/// `GET /posts/:id/likes`
pub async fn like_count<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<PostId>,
) -> Result<Json<Envelope<u64>>, ApiError>
where
  S: PrincipalStore + SocialStore + 'static,
{
  Ok(success(state.feed.like_count(id).await?))
}

// ─── Comments ─────────────────────────────────────────────────────────────────

/// `POST /posts/:id/comments`
pub async fn comment<S>(
  State(state): State<AppState<S>>,
  Requester(identity): Requester,
  Path(id): Path<PostId>,
  Json(body): Json<CommentBody>,
) -> Result<Json<Envelope<Comment>>, ApiError>
where
  S: PrincipalStore + SocialStore + 'static,
{
  let comment = state
    .feed
    .comment_on_post(&identity, id, body.comment)
    .await?;
  Ok(success(comment))
}

/// `GET /posts/:id/comments`
pub async fn comments<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<PostId>,
  Query(params): Query<PageParams>,
) -> Result<Json<Envelope<Page<Comment>>>, ApiError>
where
  S: PrincipalStore + SocialStore + 'static,
{
  Ok(success(state.feed.list_comments(id, params.into()).await?))
}

/// `DELETE /posts/:id/comments/:comment_id`
pub async fn delete_comment<S>(
  State(state): State<AppState<S>>,
  Requester(identity): Requester,
  Path((id, comment_id)): Path<(PostId, CommentId)>,
) -> Result<Json<Envelope<()>>, ApiError>
where
  S: PrincipalStore + SocialStore + 'static,
{
  state.feed.delete_comment(&identity, id, comment_id).await?;
  Ok(success(()))
}
