//! Error types for `murmur-core`.
//!
//! [`Error`] is the closed domain taxonomy raised by the services. Every
//! variant maps onto exactly one [`ErrorCode`]; the HTTP layer derives the
//! response status from the code alone.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
  model::{CommentId, PostId},
  token::TokenError,
};

/// Wire-level error code, serialised in `SCREAMING_SNAKE_CASE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
  DuplicatedUserName,
  UserNotFound,
  PostNotFound,
  CommentNotFound,
  InvalidToken,
  InvalidPassword,
  InvalidPermission,
  AlreadyLiked,
  InternalServerError,
}

impl ErrorCode {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::DuplicatedUserName => "DUPLICATED_USER_NAME",
      Self::UserNotFound => "USER_NOT_FOUND",
      Self::PostNotFound => "POST_NOT_FOUND",
      Self::CommentNotFound => "COMMENT_NOT_FOUND",
      Self::InvalidToken => "INVALID_TOKEN",
      Self::InvalidPassword => "INVALID_PASSWORD",
      Self::InvalidPermission => "INVALID_PERMISSION",
      Self::AlreadyLiked => "ALREADY_LIKED",
      Self::InternalServerError => "INTERNAL_SERVER_ERROR",
    }
  }

  /// HTTP status associated with the code.
  pub fn http_status(self) -> u16 {
    match self {
      Self::DuplicatedUserName | Self::AlreadyLiked => 409,
      Self::UserNotFound | Self::PostNotFound | Self::CommentNotFound => 404,
      Self::InvalidToken | Self::InvalidPassword | Self::InvalidPermission => 401,
      Self::InternalServerError => 500,
    }
  }

  /// Default human-readable message for the code.
  pub fn default_message(self) -> &'static str {
    match self {
      Self::DuplicatedUserName => "User name is duplicated",
      Self::UserNotFound => "User not found",
      Self::PostNotFound => "Post not found",
      Self::CommentNotFound => "Comment not found",
      Self::InvalidToken => "Token is invalid",
      Self::InvalidPassword => "Password is invalid",
      Self::InvalidPermission => "Permission is invalid",
      Self::AlreadyLiked => "User already liked the post",
      Self::InternalServerError => "Internal Server Error",
    }
  }
}

impl std::fmt::Display for ErrorCode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("user name {0:?} is already taken")]
  DuplicatedUserName(String),

  #[error("user {0} not found")]
  UserNotFound(String),

  #[error("post {0} not found")]
  PostNotFound(PostId),

  #[error("comment {comment} not found on post {post}")]
  CommentNotFound { post: PostId, comment: CommentId },

  #[error("invalid token: {0}")]
  Token(#[from] TokenError),

  #[error("password is invalid for {0:?}")]
  InvalidPassword(String),

  #[error("{principal:?} has no permission on {target}")]
  InvalidPermission { principal: String, target: String },

  #[error("{principal:?} already liked post {post}")]
  AlreadyLiked { principal: String, post: PostId },

  #[error("credential error: {0}")]
  Credential(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend failure. Store errors are never domain errors.
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }

  pub fn code(&self) -> ErrorCode {
    match self {
      Self::DuplicatedUserName(_) => ErrorCode::DuplicatedUserName,
      Self::UserNotFound(_) => ErrorCode::UserNotFound,
      Self::PostNotFound(_) => ErrorCode::PostNotFound,
      Self::CommentNotFound { .. } => ErrorCode::CommentNotFound,
      Self::Token(_) => ErrorCode::InvalidToken,
      Self::InvalidPassword(_) => ErrorCode::InvalidPassword,
      Self::InvalidPermission { .. } => ErrorCode::InvalidPermission,
      Self::AlreadyLiked { .. } => ErrorCode::AlreadyLiked,
      Self::Credential(_) | Self::Store(_) => ErrorCode::InternalServerError,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
