//! Store abstractions consumed by the services.
//!
//! Backends (e.g. `murmur-store-sqlite`) implement [`PrincipalStore`] and
//! [`SocialStore`]. Higher layers depend on these traits, not on a concrete
//! backend.
//!
//! Every method reports backend failures as [`Error::Store`](crate::Error),
//! so a single `Result` carries both domain outcomes and infrastructure
//! failures through a unit of work.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  Result,
  model::{
    Alarm, AlarmArgs, AlarmKind, Comment, CommentId, Like, NewPrincipal, Post, PostId,
    Principal, PrincipalId,
  },
  page::{Page, PageRequest},
};

// ─── Principals ──────────────────────────────────────────────────────────────

pub trait PrincipalStore: Send + Sync {
  /// Look up a live principal by its unique name.
  fn find_by_name<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Option<Principal>>> + Send + 'a;

  fn find_by_id(
    &self,
    id: PrincipalId,
  ) -> impl Future<Output = Result<Option<Principal>>> + Send + '_;

  /// Persist a new principal. The store assigns `id` and `registered_at`.
  fn save(
    &self,
    principal: NewPrincipal,
  ) -> impl Future<Output = Result<Principal>> + Send + '_;
}

// ─── Unit of work ────────────────────────────────────────────────────────────

/// Synchronous view of the entity store inside one transaction.
///
/// Nothing written through a `SocialTx` is visible to other callers until the
/// enclosing [`SocialStore::unit_of_work`] commits. Every `live_*` lookup
/// ignores soft-deleted rows.
pub trait SocialTx {
  fn principal(&mut self, id: PrincipalId) -> Result<Option<Principal>>;

  fn live_post(&mut self, id: PostId) -> Result<Option<Post>>;
  fn insert_post(&mut self, owner: PrincipalId, title: &str, body: &str) -> Result<Post>;
  fn update_post(&mut self, id: PostId, title: &str, body: &str) -> Result<Post>;
  fn soft_delete_post(&mut self, id: PostId, at: DateTime<Utc>) -> Result<()>;

  fn live_like(&mut self, principal: PrincipalId, post: PostId) -> Result<Option<Like>>;
  fn insert_like(&mut self, principal: PrincipalId, post: PostId) -> Result<Like>;
  /// Returns the number of likes swept.
  fn soft_delete_likes_by_post(&mut self, post: PostId, at: DateTime<Utc>) -> Result<usize>;

  fn live_comment(&mut self, id: CommentId) -> Result<Option<Comment>>;
  fn insert_comment(&mut self, author: PrincipalId, post: PostId, text: &str) -> Result<Comment>;
  fn soft_delete_comment(&mut self, id: CommentId, at: DateTime<Utc>) -> Result<()>;
  /// Returns the number of comments swept.
  fn soft_delete_comments_by_post(&mut self, post: PostId, at: DateTime<Utc>)
  -> Result<usize>;

  fn insert_alarm(
    &mut self,
    recipient: PrincipalId,
    kind: AlarmKind,
    args: AlarmArgs,
  ) -> Result<Alarm>;
}

// ─── Entity store ────────────────────────────────────────────────────────────

/// Abstraction over the post/like/comment/alarm backend.
///
/// Mutations go through [`unit_of_work`](Self::unit_of_work); reads are plain
/// async queries against a consistent snapshot and take no locks.
pub trait SocialStore: Send + Sync {
  /// Run `work` inside a single transaction. Commits iff `work` returns
  /// `Ok`; any error (domain or backend) rolls back every write it made.
  ///
  /// Units of work touching the same post are serialised by the backend.
  fn unit_of_work<T, F>(&self, work: F) -> impl Future<Output = Result<T>> + Send + '_
  where
    T: Send + 'static,
    F: FnOnce(&mut dyn SocialTx) -> Result<T> + Send + 'static;

  fn live_post(&self, id: PostId) -> impl Future<Output = Result<Option<Post>>> + Send + '_;

  fn list_posts(
    &self,
    page: PageRequest,
  ) -> impl Future<Output = Result<Page<Post>>> + Send + '_;

  fn list_posts_by_owner(
    &self,
    owner: PrincipalId,
    page: PageRequest,
  ) -> impl Future<Output = Result<Page<Post>>> + Send + '_;

  fn list_comments_by_post(
    &self,
    post: PostId,
    page: PageRequest,
  ) -> impl Future<Output = Result<Page<Comment>>> + Send + '_;

  /// Live likes only.
  fn count_likes_by_post(&self, post: PostId) -> impl Future<Output = Result<u64>> + Send + '_;

  fn list_alarms_by_recipient(
    &self,
    recipient: PrincipalId,
    page: PageRequest,
  ) -> impl Future<Output = Result<Page<Alarm>>> + Send + '_;
}
