//! SQLite backend for the Murmur feed.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. That thread owns the only connection,
//! so units of work execute one at a time and each one runs inside an
//! `IMMEDIATE` transaction.

mod encode;
mod queries;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
