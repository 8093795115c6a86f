//! Core types and trait definitions for the Murmur social feed.
//!
//! No HTTP and no SQL live here. This crate holds
//! the domain model, the error taxonomy, the store abstractions, the token
//! codec, and the two services that enforce the feed's consistency rules.

// Store traits spell out `+ Send` on their futures; backends implement them
// with plain `async fn`.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod credential;
pub mod error;
pub mod identity;
pub mod model;
pub mod page;
pub mod service;
pub mod store;
pub mod token;

pub use error::{Error, ErrorCode, Result};
