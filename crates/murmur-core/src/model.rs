//! Entities of the social graph.
//!
//! Rows are never physically removed. Deletion sets `deleted_at`; a row whose
//! marker is unset is *live*, and every read path only ever returns live rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Identifiers ─────────────────────────────────────────────────────────────

macro_rules! id_newtype {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct $name(pub i64);

    impl std::fmt::Display for $name {
      fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
      }
    }

    impl From<i64> for $name {
      fn from(v: i64) -> Self { Self(v) }
    }
  };
}

id_newtype!(
  /// Stable numeric id of a [`Principal`].
  PrincipalId
);
id_newtype!(PostId);
id_newtype!(LikeId);
id_newtype!(CommentId);
id_newtype!(AlarmId);

// ─── Principal ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Admin,
  #[default]
  User,
}

/// An account. `name` is unique; `password_hash` is an opaque PHC string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Principal {
  pub id:            PrincipalId,
  pub name:          String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub role:          Role,
  pub registered_at: DateTime<Utc>,
  pub updated_at:    Option<DateTime<Utc>>,
  pub deleted_at:    Option<DateTime<Utc>>,
}

/// Input to [`PrincipalStore::save`](crate::store::PrincipalStore::save).
#[derive(Debug, Clone)]
pub struct NewPrincipal {
  pub name:          String,
  pub password_hash: String,
  pub role:          Role,
}

// ─── Post ────────────────────────────────────────────────────────────────────

/// A post. `owner_id` never changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
  pub id:            PostId,
  pub owner_id:      PrincipalId,
  pub title:         String,
  pub body:          String,
  pub registered_at: DateTime<Utc>,
  pub updated_at:    Option<DateTime<Utc>>,
  pub deleted_at:    Option<DateTime<Utc>>,
}

impl Post {
  pub fn is_owned_by(&self, principal: PrincipalId) -> bool {
    self.owner_id == principal
  }
}

/// At most one live like exists per `(principal_id, post_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Like {
  pub id:            LikeId,
  pub principal_id:  PrincipalId,
  pub post_id:       PostId,
  pub registered_at: DateTime<Utc>,
  pub deleted_at:    Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
  pub id:            CommentId,
  pub post_id:       PostId,
  pub author_id:     PrincipalId,
  pub text:          String,
  pub registered_at: DateTime<Utc>,
  pub updated_at:    Option<DateTime<Utc>>,
  pub deleted_at:    Option<DateTime<Utc>>,
}

// ─── Alarm ───────────────────────────────────────────────────────────────────

/// What happened. Display text is derived from the kind and never stored, so
/// retexting needs no data migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmKind {
  NewCommentOnPost,
  NewLikeOnPost,
}

impl AlarmKind {
  pub fn text(self) -> &'static str {
    match self {
      Self::NewCommentOnPost => "new comment",
      Self::NewLikeOnPost => "new like",
    }
  }
}

/// Structured alarm payload: who acted, and on what.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmArgs {
  pub from_principal_id: PrincipalId,
  pub target_id:         PostId,
}

/// A notification owned by exactly one recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alarm {
  pub id:            AlarmId,
  pub recipient_id:  PrincipalId,
  pub kind:          AlarmKind,
  pub args:          AlarmArgs,
  pub registered_at: DateTime<Utc>,
  pub updated_at:    Option<DateTime<Utc>>,
  pub deleted_at:    Option<DateTime<Utc>>,
}

impl Alarm {
  pub fn text(&self) -> &'static str { self.kind.text() }
}
