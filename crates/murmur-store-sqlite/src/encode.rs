//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are fixed-width RFC 3339 strings (microseconds, `Z` suffix) so
//! that lexical order equals chronological order. Alarm args are compact JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use murmur_core::model::{
  Alarm, AlarmArgs, AlarmId, AlarmKind, Comment, CommentId, Like, LikeId, Post, PostId,
  Principal, PrincipalId, Role,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str {
  match r {
    Role::Admin => "admin",
    Role::User => "user",
  }
}

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "admin" => Ok(Role::Admin),
    "user" => Ok(Role::User),
    other => Err(Error::UnknownEnum { column: "role", value: other.to_owned() }),
  }
}

pub fn encode_alarm_kind(k: AlarmKind) -> &'static str {
  match k {
    AlarmKind::NewCommentOnPost => "NEW_COMMENT_ON_POST",
    AlarmKind::NewLikeOnPost => "NEW_LIKE_ON_POST",
  }
}

pub fn decode_alarm_kind(s: &str) -> Result<AlarmKind> {
  match s {
    "NEW_COMMENT_ON_POST" => Ok(AlarmKind::NewCommentOnPost),
    "NEW_LIKE_ON_POST" => Ok(AlarmKind::NewLikeOnPost),
    other => Err(Error::UnknownEnum { column: "alarm kind", value: other.to_owned() }),
  }
}

pub fn encode_alarm_args(a: &AlarmArgs) -> Result<String> { Ok(serde_json::to_string(a)?) }

// ─── Raw rows ────────────────────────────────────────────────────────────────

pub const PRINCIPAL_COLUMNS: &str =
  "id, name, password_hash, role, registered_at, updated_at, deleted_at";

pub struct RawPrincipal {
  pub id:            i64,
  pub name:          String,
  pub password_hash: String,
  pub role:          String,
  pub registered_at: String,
  pub updated_at:    Option<String>,
  pub deleted_at:    Option<String>,
}

impl RawPrincipal {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      name:          row.get(1)?,
      password_hash: row.get(2)?,
      role:          row.get(3)?,
      registered_at: row.get(4)?,
      updated_at:    row.get(5)?,
      deleted_at:    row.get(6)?,
    })
  }

  pub fn into_principal(self) -> Result<Principal> {
    Ok(Principal {
      id:            PrincipalId(self.id),
      name:          self.name,
      password_hash: self.password_hash,
      role:          decode_role(&self.role)?,
      registered_at: decode_dt(&self.registered_at)?,
      updated_at:    decode_opt_dt(self.updated_at)?,
      deleted_at:    decode_opt_dt(self.deleted_at)?,
    })
  }
}

pub const POST_COLUMNS: &str =
  "id, owner_id, title, body, registered_at, updated_at, deleted_at";

pub struct RawPost {
  pub id:            i64,
  pub owner_id:      i64,
  pub title:         String,
  pub body:          String,
  pub registered_at: String,
  pub updated_at:    Option<String>,
  pub deleted_at:    Option<String>,
}

impl RawPost {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      owner_id:      row.get(1)?,
      title:         row.get(2)?,
      body:          row.get(3)?,
      registered_at: row.get(4)?,
      updated_at:    row.get(5)?,
      deleted_at:    row.get(6)?,
    })
  }

  pub fn into_post(self) -> Result<Post> {
    Ok(Post {
      id:            PostId(self.id),
      owner_id:      PrincipalId(self.owner_id),
      title:         self.title,
      body:          self.body,
      registered_at: decode_dt(&self.registered_at)?,
      updated_at:    decode_opt_dt(self.updated_at)?,
      deleted_at:    decode_opt_dt(self.deleted_at)?,
    })
  }
}

pub const LIKE_COLUMNS: &str = "id, principal_id, post_id, registered_at, deleted_at";

pub struct RawLike {
  pub id:            i64,
  pub principal_id:  i64,
  pub post_id:       i64,
  pub registered_at: String,
  pub deleted_at:    Option<String>,
}

impl RawLike {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      principal_id:  row.get(1)?,
      post_id:       row.get(2)?,
      registered_at: row.get(3)?,
      deleted_at:    row.get(4)?,
    })
  }

  pub fn into_like(self) -> Result<Like> {
    Ok(Like {
      id:            LikeId(self.id),
      principal_id:  PrincipalId(self.principal_id),
      post_id:       PostId(self.post_id),
      registered_at: decode_dt(&self.registered_at)?,
      deleted_at:    decode_opt_dt(self.deleted_at)?,
    })
  }
}

pub const COMMENT_COLUMNS: &str =
  "id, post_id, author_id, text, registered_at, updated_at, deleted_at";

pub struct RawComment {
  pub id:            i64,
  pub post_id:       i64,
  pub author_id:     i64,
  pub text:          String,
  pub registered_at: String,
  pub updated_at:    Option<String>,
  pub deleted_at:    Option<String>,
}

impl RawComment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      post_id:       row.get(1)?,
      author_id:     row.get(2)?,
      text:          row.get(3)?,
      registered_at: row.get(4)?,
      updated_at:    row.get(5)?,
      deleted_at:    row.get(6)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      id:            CommentId(self.id),
      post_id:       PostId(self.post_id),
      author_id:     PrincipalId(self.author_id),
      text:          self.text,
      registered_at: decode_dt(&self.registered_at)?,
      updated_at:    decode_opt_dt(self.updated_at)?,
      deleted_at:    decode_opt_dt(self.deleted_at)?,
    })
  }
}

pub const ALARM_COLUMNS: &str =
  "id, recipient_id, kind, args_json, registered_at, updated_at, deleted_at";

pub struct RawAlarm {
  pub id:            i64,
  pub recipient_id:  i64,
  pub kind:          String,
  pub args_json:     String,
  pub registered_at: String,
  pub updated_at:    Option<String>,
  pub deleted_at:    Option<String>,
}

impl RawAlarm {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      recipient_id:  row.get(1)?,
      kind:          row.get(2)?,
      args_json:     row.get(3)?,
      registered_at: row.get(4)?,
      updated_at:    row.get(5)?,
      deleted_at:    row.get(6)?,
    })
  }

  pub fn into_alarm(self) -> Result<Alarm> {
    Ok(Alarm {
      id:            AlarmId(self.id),
      recipient_id:  PrincipalId(self.recipient_id),
      kind:          decode_alarm_kind(&self.kind)?,
      args:          serde_json::from_str(&self.args_json)?,
      registered_at: decode_dt(&self.registered_at)?,
      updated_at:    decode_opt_dt(self.updated_at)?,
      deleted_at:    decode_opt_dt(self.deleted_at)?,
    })
  }
}
