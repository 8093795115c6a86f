//! Error type for `murmur-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sql error: {0}")]
  Sql(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown {column} value: {value:?}")]
  UnknownEnum { column: &'static str, value: String },
}

impl From<Error> for murmur_core::Error {
  fn from(e: Error) -> Self { murmur_core::Error::store(e) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
