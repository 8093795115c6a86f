//! [`AccountService`]: sign-up, login, and token-to-identity resolution.

use std::sync::Arc;

use chrono::Duration;
use tracing::debug;

use crate::{
  Error, Result,
  credential::{hash_password, verify_password},
  identity::Identity,
  model::{Alarm, NewPrincipal, Principal, Role},
  page::{Page, PageRequest},
  service::FeedService,
  store::{PrincipalStore, SocialStore},
  token::TokenCodec,
};

pub struct AccountService<S> {
  store:     Arc<S>,
  tokens:    Arc<TokenCodec>,
  token_ttl: Duration,
}

impl<S> Clone for AccountService<S> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      tokens:    Arc::clone(&self.tokens),
      token_ttl: self.token_ttl,
    }
  }
}

impl<S: PrincipalStore> AccountService<S> {
  pub fn new(store: Arc<S>, tokens: Arc<TokenCodec>, token_ttl: Duration) -> Self {
    Self { store, tokens, token_ttl }
  }

  /// Register a new principal. Names are unique.
  pub async fn join(&self, name: &str, password: &str) -> Result<Principal> {
    if self.store.find_by_name(name).await?.is_some() {
      return Err(Error::DuplicatedUserName(name.to_owned()));
    }

    let principal = self
      .store
      .save(NewPrincipal {
        name:          name.to_owned(),
        password_hash: hash_password(password)?,
        role:          Role::User,
      })
      .await?;

    debug!(principal = %principal.id, name = %principal.name, "principal joined");
    Ok(principal)
  }

  /// Check the password and issue a bearer token for `name`.
  pub async fn login(&self, name: &str, password: &str) -> Result<String> {
    let principal = self
      .store
      .find_by_name(name)
      .await?
      .ok_or_else(|| Error::UserNotFound(name.to_owned()))?;

    if !verify_password(password, &principal.password_hash)? {
      return Err(Error::InvalidPassword(name.to_owned()));
    }

    Ok(self.tokens.issue(&principal.name, self.token_ttl)?)
  }

  /// Verify `token` and resolve its subject to a live principal.
  pub async fn authenticate(&self, token: &str) -> Result<Identity> {
    let verified = self.tokens.verify(token)?;
    self.load_identity(&verified.subject).await
  }

  pub async fn load_identity(&self, name: &str) -> Result<Identity> {
    self
      .store
      .find_by_name(name)
      .await?
      .map(|p| Identity::from(&p))
      .ok_or_else(|| Error::UserNotFound(name.to_owned()))
  }
}

impl<S: PrincipalStore + SocialStore> AccountService<S> {
  /// The caller's alarms, oldest first.
  pub async fn alarms(&self, identity: &Identity, page: PageRequest) -> Result<Page<Alarm>> {
    FeedService::new(Arc::clone(&self.store))
      .list_alarms(identity, page)
      .await
  }
}
