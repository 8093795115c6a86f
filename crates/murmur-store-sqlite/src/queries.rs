//! Synchronous queries over a borrowed connection.
//!
//! Shared by the transactional [`SqliteTx`](crate::store::SqliteTx) and by
//! the read-only paths that run inside `tokio_rusqlite::Connection::call`.
//! Every `find_*` and `list_*` query filters `deleted_at IS NULL`.

use chrono::{DateTime, Utc};
use murmur_core::{
  model::{
    Alarm, AlarmArgs, AlarmId, AlarmKind, Comment, CommentId, Like, LikeId, NewPrincipal, Post,
    PostId, Principal, PrincipalId,
  },
  page::{Page, PageRequest},
};
use rusqlite::{Connection, OptionalExtension as _, Row, ToSql, params};

use crate::{
  Result,
  encode::{
    ALARM_COLUMNS, COMMENT_COLUMNS, LIKE_COLUMNS, POST_COLUMNS, PRINCIPAL_COLUMNS, RawAlarm,
    RawComment, RawLike, RawPost, RawPrincipal, encode_alarm_args, encode_alarm_kind, encode_dt,
    encode_role,
  },
};

// ─── Principals ──────────────────────────────────────────────────────────────

pub fn find_principal_by_name(conn: &Connection, name: &str) -> Result<Option<Principal>> {
  conn
    .query_row(
      &format!("SELECT {PRINCIPAL_COLUMNS} FROM principals WHERE name = ?1 AND deleted_at IS NULL"),
      params![name],
      RawPrincipal::from_row,
    )
    .optional()?
    .map(RawPrincipal::into_principal)
    .transpose()
}

pub fn find_principal_by_id(conn: &Connection, id: PrincipalId) -> Result<Option<Principal>> {
  conn
    .query_row(
      &format!("SELECT {PRINCIPAL_COLUMNS} FROM principals WHERE id = ?1 AND deleted_at IS NULL"),
      params![id.0],
      RawPrincipal::from_row,
    )
    .optional()?
    .map(RawPrincipal::into_principal)
    .transpose()
}

pub fn insert_principal(conn: &Connection, new: &NewPrincipal) -> Result<Principal> {
  let registered_at = Utc::now();
  conn.execute(
    "INSERT INTO principals (name, password_hash, role, registered_at) VALUES (?1, ?2, ?3, ?4)",
    params![new.name, new.password_hash, encode_role(new.role), encode_dt(registered_at)],
  )?;

  Ok(Principal {
    id: PrincipalId(conn.last_insert_rowid()),
    name: new.name.clone(),
    password_hash: new.password_hash.clone(),
    role: new.role,
    registered_at,
    updated_at: None,
    deleted_at: None,
  })
}

// ─── Posts ───────────────────────────────────────────────────────────────────

pub fn find_live_post(conn: &Connection, id: PostId) -> Result<Option<Post>> {
  conn
    .query_row(
      &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1 AND deleted_at IS NULL"),
      params![id.0],
      RawPost::from_row,
    )
    .optional()?
    .map(RawPost::into_post)
    .transpose()
}

pub fn insert_post(conn: &Connection, owner: PrincipalId, title: &str, body: &str) -> Result<Post> {
  let registered_at = Utc::now();
  conn.execute(
    "INSERT INTO posts (owner_id, title, body, registered_at) VALUES (?1, ?2, ?3, ?4)",
    params![owner.0, title, body, encode_dt(registered_at)],
  )?;

  Ok(Post {
    id: PostId(conn.last_insert_rowid()),
    owner_id: owner,
    title: title.to_owned(),
    body: body.to_owned(),
    registered_at,
    updated_at: None,
    deleted_at: None,
  })
}

/// Returns the updated post, or `None` if no live post has that id.
pub fn update_post(conn: &Connection, id: PostId, title: &str, body: &str) -> Result<Option<Post>> {
  let changed = conn.execute(
    "UPDATE posts SET title = ?1, body = ?2, updated_at = ?3
     WHERE id = ?4 AND deleted_at IS NULL",
    params![title, body, encode_dt(Utc::now()), id.0],
  )?;
  if changed == 0 {
    return Ok(None);
  }
  find_live_post(conn, id)
}

pub fn soft_delete_post(conn: &Connection, id: PostId, at: DateTime<Utc>) -> Result<usize> {
  Ok(conn.execute(
    "UPDATE posts SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
    params![encode_dt(at), id.0],
  )?)
}

// ─── Likes ───────────────────────────────────────────────────────────────────

pub fn find_live_like(conn: &Connection, principal: PrincipalId, post: PostId) -> Result<Option<Like>> {
  conn
    .query_row(
      &format!(
        "SELECT {LIKE_COLUMNS} FROM likes
         WHERE principal_id = ?1 AND post_id = ?2 AND deleted_at IS NULL"
      ),
      params![principal.0, post.0],
      RawLike::from_row,
    )
    .optional()?
    .map(RawLike::into_like)
    .transpose()
}

pub fn insert_like(conn: &Connection, principal: PrincipalId, post: PostId) -> Result<Like> {
  let registered_at = Utc::now();
  conn.execute(
    "INSERT INTO likes (principal_id, post_id, registered_at) VALUES (?1, ?2, ?3)",
    params![principal.0, post.0, encode_dt(registered_at)],
  )?;

  Ok(Like {
    id: LikeId(conn.last_insert_rowid()),
    principal_id: principal,
    post_id: post,
    registered_at,
    deleted_at: None,
  })
}

pub fn soft_delete_likes_by_post(conn: &Connection, post: PostId, at: DateTime<Utc>) -> Result<usize> {
  Ok(conn.execute(
    "UPDATE likes SET deleted_at = ?1 WHERE post_id = ?2 AND deleted_at IS NULL",
    params![encode_dt(at), post.0],
  )?)
}

pub fn count_live_likes_by_post(conn: &Connection, post: PostId) -> Result<u64> {
  let n: i64 = conn.query_row(
    "SELECT COUNT(*) FROM likes WHERE post_id = ?1 AND deleted_at IS NULL",
    params![post.0],
    |r| r.get(0),
  )?;
  Ok(n as u64)
}

// ─── Comments ────────────────────────────────────────────────────────────────

pub fn find_live_comment(conn: &Connection, id: CommentId) -> Result<Option<Comment>> {
  conn
    .query_row(
      &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1 AND deleted_at IS NULL"),
      params![id.0],
      RawComment::from_row,
    )
    .optional()?
    .map(RawComment::into_comment)
    .transpose()
}

pub fn insert_comment(
  conn: &Connection,
  author: PrincipalId,
  post: PostId,
  text: &str,
) -> Result<Comment> {
  let registered_at = Utc::now();
  conn.execute(
    "INSERT INTO comments (post_id, author_id, text, registered_at) VALUES (?1, ?2, ?3, ?4)",
    params![post.0, author.0, text, encode_dt(registered_at)],
  )?;

  Ok(Comment {
    id: CommentId(conn.last_insert_rowid()),
    post_id: post,
    author_id: author,
    text: text.to_owned(),
    registered_at,
    updated_at: None,
    deleted_at: None,
  })
}

pub fn soft_delete_comment(conn: &Connection, id: CommentId, at: DateTime<Utc>) -> Result<usize> {
  Ok(conn.execute(
    "UPDATE comments SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
    params![encode_dt(at), id.0],
  )?)
}

pub fn soft_delete_comments_by_post(
  conn: &Connection,
  post: PostId,
  at: DateTime<Utc>,
) -> Result<usize> {
  Ok(conn.execute(
    "UPDATE comments SET deleted_at = ?1 WHERE post_id = ?2 AND deleted_at IS NULL",
    params![encode_dt(at), post.0],
  )?)
}

// ─── Alarms ──────────────────────────────────────────────────────────────────

pub fn insert_alarm(
  conn: &Connection,
  recipient: PrincipalId,
  kind: AlarmKind,
  args: AlarmArgs,
) -> Result<Alarm> {
  let registered_at = Utc::now();
  conn.execute(
    "INSERT INTO alarms (recipient_id, kind, args_json, registered_at) VALUES (?1, ?2, ?3, ?4)",
    params![
      recipient.0,
      encode_alarm_kind(kind),
      encode_alarm_args(&args)?,
      encode_dt(registered_at),
    ],
  )?;

  Ok(Alarm {
    id: AlarmId(conn.last_insert_rowid()),
    recipient_id: recipient,
    kind,
    args,
    registered_at,
    updated_at: None,
    deleted_at: None,
  })
}

// ─── Paged reads ─────────────────────────────────────────────────────────────

/// Count and fetch one page of live rows from `table`, oldest first.
///
/// `filter` is appended to `deleted_at IS NULL` and may reference `params`
/// with anonymous `?` placeholders.
#[allow(clippy::too_many_arguments)]
fn paged<R, T>(
  conn: &Connection,
  table: &str,
  columns: &str,
  filter: Option<&str>,
  params: &[&dyn ToSql],
  page: PageRequest,
  from_row: fn(&Row<'_>) -> rusqlite::Result<R>,
  decode: fn(R) -> Result<T>,
) -> Result<Page<T>> {
  let condition = match filter {
    Some(f) => format!("deleted_at IS NULL AND {f}"),
    None => "deleted_at IS NULL".to_owned(),
  };

  let total: i64 = conn.query_row(
    &format!("SELECT COUNT(*) FROM {table} WHERE {condition}"),
    params,
    |r| r.get(0),
  )?;

  let limit = page.limit() as i64;
  let offset = page.offset() as i64;
  let mut bound: Vec<&dyn ToSql> = params.to_vec();
  bound.push(&limit);
  bound.push(&offset);

  let mut stmt = conn.prepare(&format!(
    "SELECT {columns} FROM {table} WHERE {condition}
     ORDER BY registered_at ASC, id ASC
     LIMIT ? OFFSET ?"
  ))?;
  let raws = stmt
    .query_map(bound.as_slice(), from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let content = raws.into_iter().map(decode).collect::<Result<Vec<_>>>()?;
  Ok(Page::new(content, page, total as u64))
}

pub fn list_posts(conn: &Connection, page: PageRequest) -> Result<Page<Post>> {
  paged(conn, "posts", POST_COLUMNS, None, &[], page, RawPost::from_row, RawPost::into_post)
}

pub fn list_posts_by_owner(conn: &Connection, owner: PrincipalId, page: PageRequest) -> Result<Page<Post>> {
  paged(
    conn,
    "posts",
    POST_COLUMNS,
    Some("owner_id = ?"),
    &[&owner.0],
    page,
    RawPost::from_row,
    RawPost::into_post,
  )
}

pub fn list_comments_by_post(conn: &Connection, post: PostId, page: PageRequest) -> Result<Page<Comment>> {
  paged(
    conn,
    "comments",
    COMMENT_COLUMNS,
    Some("post_id = ?"),
    &[&post.0],
    page,
    RawComment::from_row,
    RawComment::into_comment,
  )
}

pub fn list_alarms_by_recipient(
  conn: &Connection,
  recipient: PrincipalId,
  page: PageRequest,
) -> Result<Page<Alarm>> {
  paged(
    conn,
    "alarms",
    ALARM_COLUMNS,
    Some("recipient_id = ?"),
    &[&recipient.0],
    page,
    RawAlarm::from_row,
    RawAlarm::into_alarm,
  )
}
