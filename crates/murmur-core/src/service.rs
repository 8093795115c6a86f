//! [`FeedService`]: the consistency rules of the social graph.
//!
//! Each mutating operation is one [`SocialStore::unit_of_work`]: the checks
//! and every write they guard (including alarm fan-out and the delete
//! cascade) commit together or not at all.
//!
//! Check order is always *requester → post → permission*, so a missing post
//! reports `PostNotFound` before any ownership comparison is made. Ownership
//! is compared by principal id, never by name.

use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::{
  Error, Result,
  identity::Identity,
  model::{
    Alarm, AlarmArgs, AlarmKind, Comment, CommentId, Like, Post, PostId, Principal,
  },
  page::{Page, PageRequest},
  store::{SocialStore, SocialTx},
};

pub struct FeedService<S> {
  store: Arc<S>,
}

impl<S> Clone for FeedService<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: SocialStore> FeedService<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  // ── Posts ───────────────────────────────────────────────────────────────

  pub async fn create_post(&self, owner: &Identity, title: String, body: String) -> Result<Post> {
    let owner = owner.clone();
    let post = self
      .store
      .unit_of_work(move |tx| {
        let owner = resolve_requester(tx, &owner)?;
        tx.insert_post(owner.id, &title, &body)
      })
      .await?;

    debug!(post = %post.id, owner = %post.owner_id, "post created");
    Ok(post)
  }

  /// Replace title and body. Only the owner may modify a post.
  pub async fn modify_post(
    &self,
    requester: &Identity,
    post_id: PostId,
    title: String,
    body: String,
  ) -> Result<Post> {
    let requester = requester.clone();
    let post = self
      .store
      .unit_of_work(move |tx| {
        let principal = resolve_requester(tx, &requester)?;
        owned_post(tx, &principal, post_id)?;
        tx.update_post(post_id, &title, &body)
      })
      .await?;

    debug!(post = %post.id, "post modified");
    Ok(post)
  }

  /// Soft-delete the post together with all of its live likes and comments.
  pub async fn delete_post(&self, requester: &Identity, post_id: PostId) -> Result<()> {
    let requester = requester.clone();
    let (likes, comments) = self
      .store
      .unit_of_work(move |tx| {
        let principal = resolve_requester(tx, &requester)?;
        owned_post(tx, &principal, post_id)?;

        let at = Utc::now();
        let likes = tx.soft_delete_likes_by_post(post_id, at)?;
        let comments = tx.soft_delete_comments_by_post(post_id, at)?;
        tx.soft_delete_post(post_id, at)?;
        Ok((likes, comments))
      })
      .await?;

    debug!(post = %post_id, likes, comments, "post deleted");
    Ok(())
  }

  pub async fn list_posts(&self, page: PageRequest) -> Result<Page<Post>> {
    self.store.list_posts(page).await
  }

  pub async fn list_my_posts(&self, requester: &Identity, page: PageRequest) -> Result<Page<Post>> {
    self.store.list_posts_by_owner(requester.principal_id, page).await
  }

  // ── Likes ───────────────────────────────────────────────────────────────

  /// Like a post and notify its owner.
  ///
  /// A second like by the same principal while the first is live fails with
  /// [`Error::AlreadyLiked`]. The owner is notified even when liking their
  /// own post.
  pub async fn like_post(&self, requester: &Identity, post_id: PostId) -> Result<Like> {
    let requester = requester.clone();
    let (like, alarm) = self
      .store
      .unit_of_work(move |tx| {
        let post = live_post(tx, post_id)?;
        let principal = resolve_requester(tx, &requester)?;

        if tx.live_like(principal.id, post.id)?.is_some() {
          return Err(Error::AlreadyLiked { principal: principal.name, post: post.id });
        }

        let like = tx.insert_like(principal.id, post.id)?;
        let alarm = notify_owner(tx, &post, &principal, AlarmKind::NewLikeOnPost)?;
        Ok((like, alarm))
      })
      .await?;

    debug!(post = %post_id, like = %like.id, alarm = %alarm.id, "post liked");
    Ok(like)
  }

  /// Number of live likes on a live post.
  pub async fn like_count(&self, post_id: PostId) -> Result<u64> {
    self
      .store
      .live_post(post_id)
      .await?
      .ok_or(Error::PostNotFound(post_id))?;
    self.store.count_likes_by_post(post_id).await
  }

  // ── Comments ────────────────────────────────────────────────────────────

  /// Comment on a post and notify its owner.
  pub async fn comment_on_post(
    &self,
    requester: &Identity,
    post_id: PostId,
    text: String,
  ) -> Result<Comment> {
    let requester = requester.clone();
    let (comment, alarm) = self
      .store
      .unit_of_work(move |tx| {
        let post = live_post(tx, post_id)?;
        let principal = resolve_requester(tx, &requester)?;

        let comment = tx.insert_comment(principal.id, post.id, &text)?;
        let alarm = notify_owner(tx, &post, &principal, AlarmKind::NewCommentOnPost)?;
        Ok((comment, alarm))
      })
      .await?;

    debug!(post = %post_id, comment = %comment.id, alarm = %alarm.id, "comment added");
    Ok(comment)
  }

  /// Soft-delete a single comment. Only its author may delete it.
  pub async fn delete_comment(
    &self,
    requester: &Identity,
    post_id: PostId,
    comment_id: CommentId,
  ) -> Result<()> {
    let requester = requester.clone();
    self
      .store
      .unit_of_work(move |tx| {
        let principal = resolve_requester(tx, &requester)?;
        live_post(tx, post_id)?;

        let comment = tx
          .live_comment(comment_id)?
          .filter(|c| c.post_id == post_id)
          .ok_or(Error::CommentNotFound { post: post_id, comment: comment_id })?;

        if comment.author_id != principal.id {
          return Err(Error::InvalidPermission {
            principal: principal.name,
            target:    format!("comment {comment_id}"),
          });
        }

        tx.soft_delete_comment(comment_id, Utc::now())
      })
      .await?;

    debug!(post = %post_id, comment = %comment_id, "comment deleted");
    Ok(())
  }

  pub async fn list_comments(&self, post_id: PostId, page: PageRequest) -> Result<Page<Comment>> {
    self
      .store
      .live_post(post_id)
      .await?
      .ok_or(Error::PostNotFound(post_id))?;
    self.store.list_comments_by_post(post_id, page).await
  }

  // ── Alarms ──────────────────────────────────────────────────────────────

  /// The requester's own alarms, oldest first.
  pub async fn list_alarms(&self, requester: &Identity, page: PageRequest) -> Result<Page<Alarm>> {
    self
      .store
      .list_alarms_by_recipient(requester.principal_id, page)
      .await
  }
}

// ─── Unit-of-work helpers ────────────────────────────────────────────────────

fn resolve_requester(tx: &mut dyn SocialTx, who: &Identity) -> Result<Principal> {
  tx.principal(who.principal_id)?
    .ok_or_else(|| Error::UserNotFound(who.name.clone()))
}

fn live_post(tx: &mut dyn SocialTx, id: PostId) -> Result<Post> {
  tx.live_post(id)?.ok_or(Error::PostNotFound(id))
}

fn owned_post(tx: &mut dyn SocialTx, principal: &Principal, id: PostId) -> Result<Post> {
  let post = live_post(tx, id)?;
  if !post.is_owned_by(principal.id) {
    return Err(Error::InvalidPermission {
      principal: principal.name.clone(),
      target:    format!("post {id}"),
    });
  }
  Ok(post)
}

fn notify_owner(
  tx: &mut dyn SocialTx,
  post: &Post,
  actor: &Principal,
  kind: AlarmKind,
) -> Result<Alarm> {
  let args = AlarmArgs { from_principal_id: actor.id, target_id: post.id };
  tx.insert_alarm(post.owner_id, kind, args)
}
