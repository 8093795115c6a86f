//! Integration tests for `SqliteStore` and the services running on top of
//! it, against an in-memory database.

use std::sync::Arc;

use chrono::Duration;
use murmur_core::{
  Error, ErrorCode,
  account::AccountService,
  identity::Identity,
  model::{AlarmArgs, AlarmKind, CommentId, NewPrincipal, PostId, PrincipalId, Role},
  page::PageRequest,
  service::FeedService,
  store::{PrincipalStore, SocialStore},
  token::TokenCodec,
};

use crate::SqliteStore;

async fn store() -> Arc<SqliteStore> {
  Arc::new(
    SqliteStore::open_in_memory()
      .await
      .expect("in-memory store"),
  )
}

async fn principal(s: &SqliteStore, name: &str) -> Identity {
  let p = s
    .save(NewPrincipal {
      name:          name.into(),
      password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
      role:          Role::User,
    })
    .await
    .unwrap();
  Identity::from(&p)
}

fn page() -> PageRequest { PageRequest::default() }

// ─── Principals ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn save_and_find_principal() {
  let s = store().await;
  let alice = principal(&s, "alice").await;

  let by_name = s.find_by_name("alice").await.unwrap().unwrap();
  assert_eq!(by_name.id, alice.principal_id);
  assert_eq!(by_name.role, Role::User);

  let by_id = s.find_by_id(alice.principal_id).await.unwrap().unwrap();
  assert_eq!(by_id.name, "alice");
}

#[tokio::test]
async fn find_missing_principal_returns_none() {
  let s = store().await;
  assert!(s.find_by_name("nobody").await.unwrap().is_none());
  assert!(s.find_by_id(PrincipalId(42)).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_live_name_is_rejected_by_the_store() {
  let s = store().await;
  principal(&s, "alice").await;
  let err = s
    .save(NewPrincipal {
      name:          "alice".into(),
      password_hash: "x".into(),
      role:          Role::User,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::DuplicatedUserName(ref n) if n == "alice"), "{err:?}");
}

// ─── Posts ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_list_posts_in_creation_order() {
  let s = store().await;
  let feed = FeedService::new(s.clone());
  let alice = principal(&s, "alice").await;
  let bob = principal(&s, "bob").await;

  for i in 0..5 {
    feed
      .create_post(&alice, format!("title {i}"), "body".into())
      .await
      .unwrap();
  }
  feed.create_post(&bob, "bob's".into(), "body".into()).await.unwrap();

  let first = feed.list_posts(PageRequest::new(0, 4)).await.unwrap();
  assert_eq!(first.total_elements, 6);
  assert_eq!(first.total_pages, 2);
  let titles: Vec<_> = first.content.iter().map(|p| p.title.as_str()).collect();
  assert_eq!(titles, ["title 0", "title 1", "title 2", "title 3"]);

  // A new row does not shift an already-returned page boundary.
  feed.create_post(&bob, "late".into(), "body".into()).await.unwrap();
  let second = feed.list_posts(PageRequest::new(1, 4)).await.unwrap();
  let titles: Vec<_> = second.content.iter().map(|p| p.title.as_str()).collect();
  assert_eq!(titles, ["title 4", "bob's", "late"]);

  let mine = feed.list_my_posts(&bob, page()).await.unwrap();
  assert_eq!(mine.total_elements, 2);
  assert!(mine.content.iter().all(|p| p.owner_id == bob.principal_id));
}

#[tokio::test]
async fn create_post_for_unknown_principal_fails() {
  let s = store().await;
  let feed = FeedService::new(s.clone());
  let ghost = Identity {
    principal_id: PrincipalId(999),
    name:         "ghost".into(),
    roles:        vec![Role::User],
  };

  let err = feed
    .create_post(&ghost, "t".into(), "b".into())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::UserNotFound(_)), "{err:?}");
  assert_eq!(feed.list_posts(page()).await.unwrap().total_elements, 0);
}

#[tokio::test]
async fn owner_can_modify_post() {
  let s = store().await;
  let feed = FeedService::new(s.clone());
  let alice = principal(&s, "alice").await;

  let post = feed.create_post(&alice, "old".into(), "old body".into()).await.unwrap();
  let updated = feed
    .modify_post(&alice, post.id, "new".into(), "new body".into())
    .await
    .unwrap();

  assert_eq!(updated.id, post.id);
  assert_eq!(updated.title, "new");
  assert_eq!(updated.body, "new body");
  assert!(updated.updated_at.is_some());
  assert_eq!(updated.owner_id, alice.principal_id);
}

#[tokio::test]
async fn non_owner_cannot_modify_or_delete() {
  let s = store().await;
  let feed = FeedService::new(s.clone());
  let alice = principal(&s, "alice").await;
  let bob = principal(&s, "bob").await;
  let post = feed.create_post(&alice, "t".into(), "b".into()).await.unwrap();

  let err = feed
    .modify_post(&bob, post.id, "x".into(), "y".into())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::InvalidPermission { .. }), "{err:?}");

  let err = feed.delete_post(&bob, post.id).await.unwrap_err();
  assert_eq!(err.code(), ErrorCode::InvalidPermission);

  let still_there = s.live_post(post.id).await.unwrap().unwrap();
  assert_eq!(still_there.title, "t");
}

#[tokio::test]
async fn not_found_takes_precedence_over_permission() {
  let s = store().await;
  let feed = FeedService::new(s.clone());
  let bob = principal(&s, "bob").await;

  let err = feed
    .modify_post(&bob, PostId(404), "x".into(), "y".into())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::PostNotFound(PostId(404))), "{err:?}");

  let err = feed.delete_post(&bob, PostId(404)).await.unwrap_err();
  assert_eq!(err.code(), ErrorCode::PostNotFound);
}

// ─── Likes and alarms ────────────────────────────────────────────────────────

#[tokio::test]
async fn like_notifies_owner_once_and_rejects_duplicates() {
  let s = store().await;
  let feed = FeedService::new(s.clone());
  let alice = principal(&s, "alice").await;
  let bob = principal(&s, "bob").await;
  let post = feed.create_post(&alice, "t".into(), "b".into()).await.unwrap();

  feed.like_post(&bob, post.id).await.unwrap();

  let alarms = feed.list_alarms(&alice, page()).await.unwrap();
  assert_eq!(alarms.total_elements, 1);
  let alarm = &alarms.content[0];
  assert_eq!(alarm.kind, AlarmKind::NewLikeOnPost);
  assert_eq!(alarm.text(), "new like");
  assert_eq!(alarm.recipient_id, alice.principal_id);
  assert_eq!(
    alarm.args,
    AlarmArgs { from_principal_id: bob.principal_id, target_id: post.id }
  );

  let err = feed.like_post(&bob, post.id).await.unwrap_err();
  assert!(matches!(err, Error::AlreadyLiked { .. }), "{err:?}");
  assert_eq!(feed.list_alarms(&alice, page()).await.unwrap().total_elements, 1);
  assert_eq!(feed.like_count(post.id).await.unwrap(), 1);

  // The liker's own alarm list is untouched.
  assert_eq!(feed.list_alarms(&bob, page()).await.unwrap().total_elements, 0);
}

#[tokio::test]
async fn self_like_still_notifies_owner() {
  let s = store().await;
  let feed = FeedService::new(s.clone());
  let alice = principal(&s, "alice").await;
  let post = feed.create_post(&alice, "t".into(), "b".into()).await.unwrap();

  feed.like_post(&alice, post.id).await.unwrap();
  feed
    .comment_on_post(&alice, post.id, "me again".into())
    .await
    .unwrap();

  let alarms = feed.list_alarms(&alice, page()).await.unwrap();
  let kinds: Vec<_> = alarms.content.iter().map(|a| a.kind).collect();
  assert_eq!(kinds, [AlarmKind::NewLikeOnPost, AlarmKind::NewCommentOnPost]);
  assert!(
    alarms
      .content
      .iter()
      .all(|a| a.args.from_principal_id == alice.principal_id)
  );
}

#[tokio::test]
async fn like_count_counts_distinct_likers() {
  let s = store().await;
  let feed = FeedService::new(s.clone());
  let alice = principal(&s, "alice").await;
  let post = feed.create_post(&alice, "t".into(), "b".into()).await.unwrap();

  for name in ["bob", "carol", "dave"] {
    let who = principal(&s, name).await;
    feed.like_post(&who, post.id).await.unwrap();
  }
  assert_eq!(feed.like_count(post.id).await.unwrap(), 3);

  let err = feed.like_count(PostId(12345)).await.unwrap_err();
  assert!(matches!(err, Error::PostNotFound(_)), "{err:?}");
}

#[tokio::test]
async fn concurrent_likes_by_same_principal_insert_once() {
  let s = store().await;
  let feed = FeedService::new(s.clone());
  let alice = principal(&s, "alice").await;
  let bob = principal(&s, "bob").await;
  let post = feed.create_post(&alice, "t".into(), "b".into()).await.unwrap();

  let post_id = post.id;
  let tasks: Vec<_> = (0..8)
    .map(|_| {
      let feed = feed.clone();
      let bob = bob.clone();
      tokio::spawn(async move { feed.like_post(&bob, post_id).await })
    })
    .collect();

  let mut ok = 0;
  let mut already = 0;
  for t in tasks {
    match t.await.unwrap() {
      Ok(_) => ok += 1,
      Err(Error::AlreadyLiked { .. }) => already += 1,
      Err(e) => panic!("unexpected error: {e:?}"),
    }
  }
  assert_eq!((ok, already), (1, 7));
  assert_eq!(feed.like_count(post.id).await.unwrap(), 1);
  assert_eq!(feed.list_alarms(&alice, page()).await.unwrap().total_elements, 1);
}

#[tokio::test]
async fn likes_and_comments_racing_a_delete_are_rejected_or_swept() {
  let s = store().await;
  let feed = FeedService::new(s.clone());
  let alice = principal(&s, "alice").await;
  let post = feed.create_post(&alice, "t".into(), "b".into()).await.unwrap();
  let post_id = post.id;

  let mut fans = Vec::new();
  for i in 0..6 {
    fans.push(principal(&s, &format!("fan{i}")).await);
  }

  let mut likes = Vec::new();
  let mut comments = Vec::new();
  for (i, fan) in fans.iter().enumerate() {
    let (feed, fan) = (feed.clone(), fan.clone());
    if i % 2 == 0 {
      likes.push(tokio::spawn(async move { feed.like_post(&fan, post_id).await }));
    } else {
      comments.push(tokio::spawn(async move {
        feed.comment_on_post(&fan, post_id, "racing".into()).await
      }));
    }
  }
  let delete = {
    let (feed, alice) = (feed.clone(), alice.clone());
    tokio::spawn(async move { feed.delete_post(&alice, post_id).await })
  };

  delete.await.unwrap().unwrap();
  for t in likes {
    match t.await.unwrap() {
      Ok(like) => {
        let (who, post) = (like.principal_id, like.post_id);
        let still_live = s
          .unit_of_work(move |tx| tx.live_like(who, post))
          .await
          .unwrap();
        assert!(still_live.is_none(), "like {} survived the delete", like.id);
      }
      Err(Error::PostNotFound(_)) => {}
      Err(e) => panic!("unexpected error: {e:?}"),
    }
  }
  for t in comments {
    match t.await.unwrap() {
      Ok(_) | Err(Error::PostNotFound(_)) => {}
      Err(e) => panic!("unexpected error: {e:?}"),
    }
  }

  assert_eq!(s.count_likes_by_post(post_id).await.unwrap(), 0);
  let live_comments = s.list_comments_by_post(post_id, page()).await.unwrap();
  assert_eq!(live_comments.total_elements, 0);
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn comment_notifies_owner_and_lists_in_order() {
  let s = store().await;
  let feed = FeedService::new(s.clone());
  let alice = principal(&s, "alice").await;
  let bob = principal(&s, "bob").await;
  let post = feed.create_post(&alice, "t".into(), "b".into()).await.unwrap();

  feed.comment_on_post(&bob, post.id, "first".into()).await.unwrap();
  feed.comment_on_post(&bob, post.id, "second".into()).await.unwrap();

  let comments = feed.list_comments(post.id, page()).await.unwrap();
  let texts: Vec<_> = comments.content.iter().map(|c| c.text.as_str()).collect();
  assert_eq!(texts, ["first", "second"]);
  assert!(comments.content.iter().all(|c| c.author_id == bob.principal_id));

  let alarms = feed.list_alarms(&alice, page()).await.unwrap();
  assert_eq!(alarms.total_elements, 2);
  assert!(alarms.content.iter().all(|a| a.kind == AlarmKind::NewCommentOnPost));
}

#[tokio::test]
async fn comment_on_missing_post_fails_without_alarm() {
  let s = store().await;
  let feed = FeedService::new(s.clone());
  let bob = principal(&s, "bob").await;

  let err = feed
    .comment_on_post(&bob, PostId(7), "hello?".into())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::PostNotFound(_)), "{err:?}");
  assert_eq!(feed.list_alarms(&bob, page()).await.unwrap().total_elements, 0);
}

#[tokio::test]
async fn only_author_can_delete_comment() {
  let s = store().await;
  let feed = FeedService::new(s.clone());
  let alice = principal(&s, "alice").await;
  let bob = principal(&s, "bob").await;
  let post = feed.create_post(&alice, "t".into(), "b".into()).await.unwrap();
  let other = feed.create_post(&alice, "t2".into(), "b2".into()).await.unwrap();
  let comment = feed.comment_on_post(&bob, post.id, "hi".into()).await.unwrap();

  let err = feed.delete_comment(&alice, post.id, comment.id).await.unwrap_err();
  assert_eq!(err.code(), ErrorCode::InvalidPermission);

  let err = feed.delete_comment(&bob, other.id, comment.id).await.unwrap_err();
  assert_eq!(err.code(), ErrorCode::CommentNotFound);

  let err = feed
    .delete_comment(&bob, post.id, CommentId(999))
    .await
    .unwrap_err();
  assert_eq!(err.code(), ErrorCode::CommentNotFound);

  feed.delete_comment(&bob, post.id, comment.id).await.unwrap();
  assert_eq!(feed.list_comments(post.id, page()).await.unwrap().total_elements, 0);

  let err = feed.delete_comment(&bob, post.id, comment.id).await.unwrap_err();
  assert_eq!(err.code(), ErrorCode::CommentNotFound);
}

// ─── Delete cascade ──────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_post_cascades_to_likes_and_comments() {
  let s = store().await;
  let feed = FeedService::new(s.clone());
  let alice = principal(&s, "alice").await;
  let bob = principal(&s, "bob").await;
  let post = feed.create_post(&alice, "t".into(), "b".into()).await.unwrap();
  let keep = feed.create_post(&alice, "keep".into(), "b".into()).await.unwrap();

  feed.like_post(&bob, post.id).await.unwrap();
  feed.like_post(&bob, keep.id).await.unwrap();
  feed.comment_on_post(&bob, post.id, "c1".into()).await.unwrap();
  feed.comment_on_post(&bob, keep.id, "c2".into()).await.unwrap();

  feed.delete_post(&alice, post.id).await.unwrap();

  assert!(matches!(feed.like_count(post.id).await, Err(Error::PostNotFound(_))));
  assert!(matches!(
    feed.list_comments(post.id, page()).await,
    Err(Error::PostNotFound(_))
  ));
  assert!(matches!(
    feed.like_post(&bob, post.id).await,
    Err(Error::PostNotFound(_))
  ));

  // No dependent row of the deleted post is still live.
  let bob_id = bob.principal_id;
  let post_id = post.id;
  let (like, comments) = s
    .unit_of_work(move |tx| {
      let like = tx.live_like(bob_id, post_id)?;
      Ok((like, sweep_live_comments(tx, post_id)?))
    })
    .await
    .unwrap();
  assert!(like.is_none());
  assert_eq!(comments, 0);

  // The sibling post is untouched.
  assert_eq!(feed.like_count(keep.id).await.unwrap(), 1);
  assert_eq!(feed.list_comments(keep.id, page()).await.unwrap().total_elements, 1);
  assert_eq!(feed.list_posts(page()).await.unwrap().total_elements, 1);
}

/// Returns how many comments on `post` were still live.
fn sweep_live_comments(
  tx: &mut dyn murmur_core::store::SocialTx,
  post: PostId,
) -> murmur_core::Result<usize> {
  tx.soft_delete_comments_by_post(post, chrono::Utc::now())
}

#[tokio::test]
async fn like_becomes_available_again_after_sweep() {
  let s = store().await;
  let feed = FeedService::new(s.clone());
  let alice = principal(&s, "alice").await;
  let bob = principal(&s, "bob").await;
  let post = feed.create_post(&alice, "t".into(), "b".into()).await.unwrap();
  feed.like_post(&bob, post.id).await.unwrap();

  let (bob_id, post_id) = (bob.principal_id, post.id);
  let relike = s
    .unit_of_work(move |tx| {
      let swept = tx.soft_delete_likes_by_post(post_id, chrono::Utc::now())?;
      assert_eq!(swept, 1);
      assert!(tx.live_like(bob_id, post_id)?.is_none());
      tx.insert_like(bob_id, post_id)
    })
    .await
    .unwrap();

  assert_eq!(relike.principal_id, bob_id);
  assert_eq!(feed.like_count(post.id).await.unwrap(), 1);
  assert!(matches!(
    feed.like_post(&bob, post.id).await,
    Err(Error::AlreadyLiked { .. })
  ));
}

#[tokio::test]
async fn failed_unit_of_work_leaves_no_partial_effect() {
  let s = store().await;
  let alice = principal(&s, "alice").await;
  let owner = alice.principal_id;

  let err = s
    .unit_of_work(move |tx| -> murmur_core::Result<()> {
      let post = tx.insert_post(owner, "ghost", "never committed")?;
      tx.insert_alarm(
        owner,
        AlarmKind::NewLikeOnPost,
        AlarmArgs { from_principal_id: owner, target_id: post.id },
      )?;
      Err(Error::PostNotFound(post.id))
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::PostNotFound(_)));

  assert_eq!(s.list_posts(page()).await.unwrap().total_elements, 0);
  assert_eq!(
    s.list_alarms_by_recipient(owner, page()).await.unwrap().total_elements,
    0
  );
}

// ─── Accounts ────────────────────────────────────────────────────────────────

fn accounts(s: Arc<SqliteStore>) -> AccountService<SqliteStore> {
  AccountService::new(
    s,
    Arc::new(TokenCodec::new(b"test-secret")),
    Duration::hours(1),
  )
}

#[tokio::test]
async fn join_then_login_then_authenticate() {
  let s = store().await;
  let acc = accounts(s.clone());

  let alice = acc.join("alice", "correct horse").await.unwrap();
  assert_ne!(alice.password_hash, "correct horse");

  let token = acc.login("alice", "correct horse").await.unwrap();
  let identity = acc.authenticate(&token).await.unwrap();
  assert_eq!(identity.principal_id, alice.id);
  assert_eq!(identity.name, "alice");
  assert_eq!(identity.roles, [Role::User]);
}

#[tokio::test]
async fn join_rejects_duplicate_name() {
  let s = store().await;
  let acc = accounts(s.clone());
  acc.join("alice", "pw").await.unwrap();

  let err = acc.join("alice", "other").await.unwrap_err();
  assert!(matches!(err, Error::DuplicatedUserName(_)), "{err:?}");
}

#[tokio::test]
async fn concurrent_joins_with_same_name_report_duplicate() {
  let s = store().await;
  let acc = accounts(s.clone());

  let (first, second) = tokio::join!(acc.join("alice", "pw"), acc.join("alice", "pw2"));
  let outcomes = [first, second];

  let joined = outcomes.iter().filter(|r| r.is_ok()).count();
  assert_eq!(joined, 1, "{outcomes:?}");
  for r in &outcomes {
    if let Err(e) = r {
      assert_eq!(e.code(), ErrorCode::DuplicatedUserName, "{e:?}");
    }
  }
  assert!(s.find_by_name("alice").await.unwrap().is_some());
}

#[tokio::test]
async fn login_failures() {
  let s = store().await;
  let acc = accounts(s.clone());
  acc.join("alice", "pw").await.unwrap();

  let err = acc.login("bob", "pw").await.unwrap_err();
  assert_eq!(err.code(), ErrorCode::UserNotFound);

  let err = acc.login("alice", "wrong").await.unwrap_err();
  assert_eq!(err.code(), ErrorCode::InvalidPassword);
}

#[tokio::test]
async fn alarms_are_scoped_to_the_caller() {
  let s = store().await;
  let acc = accounts(s.clone());
  let feed = FeedService::new(s.clone());
  let alice = Identity::from(&acc.join("alice", "pw").await.unwrap());
  let bob = Identity::from(&acc.join("bob", "pw").await.unwrap());
  let post = feed.create_post(&alice, "t".into(), "b".into()).await.unwrap();
  feed.comment_on_post(&bob, post.id, "hi".into()).await.unwrap();

  let mine = acc.alarms(&alice, page()).await.unwrap();
  assert_eq!(mine.total_elements, 1);
  assert_eq!(mine.content[0].text(), "new comment");
  assert_eq!(acc.alarms(&bob, page()).await.unwrap().total_elements, 0);
}

#[tokio::test]
async fn token_for_unknown_subject_does_not_authenticate() {
  let s = store().await;
  let acc = accounts(s.clone());
  let token = TokenCodec::new(b"test-secret")
    .issue("nobody", Duration::hours(1))
    .unwrap();

  let err = acc.authenticate(&token).await.unwrap_err();
  assert_eq!(err.code(), ErrorCode::UserNotFound);
}
