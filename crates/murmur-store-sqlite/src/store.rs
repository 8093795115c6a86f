//! [`SqliteStore`], the SQLite implementation of [`PrincipalStore`] and
//! [`SocialStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use murmur_core::{
  Error as CoreError, Result as CoreResult,
  model::{
    Alarm, AlarmArgs, AlarmKind, Comment, CommentId, Like, NewPrincipal, Post, PostId, Principal,
    PrincipalId,
  },
  page::{Page, PageRequest},
  store::{PrincipalStore, SocialStore, SocialTx},
};
use rusqlite::{Connection, TransactionBehavior};

use crate::{Result, queries, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Murmur store backed by a single SQLite file.
///
/// Clones share one connection thread, so every unit of work is serialized.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an empty in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a read-only query on the connection thread.
  async fn read<T, F>(&self, query: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
  {
    self.conn.call(move |conn| Ok(query(conn))).await?
  }
}

// ─── Unit of work ────────────────────────────────────────────────────────────

/// [`SocialTx`] over an open `IMMEDIATE` transaction.
pub(crate) struct SqliteTx<'c> {
  conn: &'c Connection,
}

impl SocialTx for SqliteTx<'_> {
  fn principal(&mut self, id: PrincipalId) -> CoreResult<Option<Principal>> {
    Ok(queries::find_principal_by_id(self.conn, id)?)
  }

  fn live_post(&mut self, id: PostId) -> CoreResult<Option<Post>> {
    Ok(queries::find_live_post(self.conn, id)?)
  }

  fn insert_post(&mut self, owner: PrincipalId, title: &str, body: &str) -> CoreResult<Post> {
    Ok(queries::insert_post(self.conn, owner, title, body)?)
  }

  fn update_post(&mut self, id: PostId, title: &str, body: &str) -> CoreResult<Post> {
    queries::update_post(self.conn, id, title, body)?.ok_or(CoreError::PostNotFound(id))
  }

  fn soft_delete_post(&mut self, id: PostId, at: DateTime<Utc>) -> CoreResult<()> {
    match queries::soft_delete_post(self.conn, id, at)? {
      0 => Err(CoreError::PostNotFound(id)),
      _ => Ok(()),
    }
  }

  fn live_like(&mut self, principal: PrincipalId, post: PostId) -> CoreResult<Option<Like>> {
    Ok(queries::find_live_like(self.conn, principal, post)?)
  }

  fn insert_like(&mut self, principal: PrincipalId, post: PostId) -> CoreResult<Like> {
    Ok(queries::insert_like(self.conn, principal, post)?)
  }

  fn soft_delete_likes_by_post(&mut self, post: PostId, at: DateTime<Utc>) -> CoreResult<usize> {
    Ok(queries::soft_delete_likes_by_post(self.conn, post, at)?)
  }

  fn live_comment(&mut self, id: CommentId) -> CoreResult<Option<Comment>> {
    Ok(queries::find_live_comment(self.conn, id)?)
  }

  fn insert_comment(
    &mut self,
    author: PrincipalId,
    post: PostId,
    text: &str,
  ) -> CoreResult<Comment> {
    Ok(queries::insert_comment(self.conn, author, post, text)?)
  }

  fn soft_delete_comment(&mut self, id: CommentId, at: DateTime<Utc>) -> CoreResult<()> {
    queries::soft_delete_comment(self.conn, id, at)?;
    Ok(())
  }

  fn soft_delete_comments_by_post(
    &mut self,
    post: PostId,
    at: DateTime<Utc>,
  ) -> CoreResult<usize> {
    Ok(queries::soft_delete_comments_by_post(self.conn, post, at)?)
  }

  fn insert_alarm(
    &mut self,
    recipient: PrincipalId,
    kind: AlarmKind,
    args: AlarmArgs,
  ) -> CoreResult<Alarm> {
    Ok(queries::insert_alarm(self.conn, recipient, kind, args)?)
  }
}

// ─── PrincipalStore impl ─────────────────────────────────────────────────────

impl PrincipalStore for SqliteStore {
  async fn find_by_name(&self, name: &str) -> CoreResult<Option<Principal>> {
    let name = name.to_owned();
    Ok(self.read(move |conn| queries::find_principal_by_name(conn, &name)).await?)
  }

  async fn find_by_id(&self, id: PrincipalId) -> CoreResult<Option<Principal>> {
    Ok(self.read(move |conn| queries::find_principal_by_id(conn, id)).await?)
  }

  async fn save(&self, principal: NewPrincipal) -> CoreResult<Principal> {
    let name = principal.name.clone();
    match self.read(move |conn| queries::insert_principal(conn, &principal)).await {
      Ok(saved) => Ok(saved),
      // A concurrent join took the name between lookup and insert.
      Err(e) if is_constraint_violation(&e) => Err(CoreError::DuplicatedUserName(name)),
      Err(e) => Err(e.into()),
    }
  }
}

fn is_constraint_violation(e: &crate::Error) -> bool {
  matches!(
    e,
    crate::Error::Sql(rusqlite::Error::SqliteFailure(f, _))
      if f.code == rusqlite::ErrorCode::ConstraintViolation
  )
}

// ─── SocialStore impl ────────────────────────────────────────────────────────

impl SocialStore for SqliteStore {
  async fn unit_of_work<T, F>(&self, work: F) -> CoreResult<T>
  where
    T: Send + 'static,
    F: FnOnce(&mut dyn SocialTx) -> CoreResult<T> + Send + 'static,
  {
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let scope: &Connection = &tx;
        let outcome = work(&mut SqliteTx { conn: scope });

        // Commit only on success.
        if outcome.is_ok() {
          tx.commit()?;
        } else {
          tx.rollback()?;
        }
        Ok(outcome)
      })
      .await
      .map_err(crate::Error::from)?;

    if let Err(e) = &outcome {
      tracing::debug!(error = %e, "unit of work rolled back");
    }
    outcome
  }

  async fn live_post(&self, id: PostId) -> CoreResult<Option<Post>> {
    Ok(self.read(move |conn| queries::find_live_post(conn, id)).await?)
  }

  async fn list_posts(&self, page: PageRequest) -> CoreResult<Page<Post>> {
    Ok(self.read(move |conn| queries::list_posts(conn, page)).await?)
  }

  async fn list_posts_by_owner(
    &self,
    owner: PrincipalId,
    page: PageRequest,
  ) -> CoreResult<Page<Post>> {
    Ok(self.read(move |conn| queries::list_posts_by_owner(conn, owner, page)).await?)
  }

  async fn list_comments_by_post(
    &self,
    post: PostId,
    page: PageRequest,
  ) -> CoreResult<Page<Comment>> {
    Ok(self.read(move |conn| queries::list_comments_by_post(conn, post, page)).await?)
  }

  async fn count_likes_by_post(&self, post: PostId) -> CoreResult<u64> {
    Ok(self.read(move |conn| queries::count_live_likes_by_post(conn, post)).await?)
  }

  async fn list_alarms_by_recipient(
    &self,
    recipient: PrincipalId,
    page: PageRequest,
  ) -> CoreResult<Page<Alarm>> {
    Ok(self.read(move |conn| queries::list_alarms_by_recipient(conn, recipient, page)).await?)
  }
}
