//! Signed, self-contained bearer tokens.
//!
//! A token is a compact HS256 JWS carrying the principal name (`sub`) and an
//! absolute expiry (`exp`, whole seconds). It is valid iff the signature
//! verifies under the process-wide secret **and** `now < exp`. There is no
//! revocation list; rotating the secret invalidates every outstanding token.
//!
//! The signature is always checked before the expiry: `jsonwebtoken`'s own
//! `exp` validation is switched off and the comparison happens afterwards
//! against a caller-supplied clock, so an expired-but-forged token reports
//! [`TokenError::Malformed`], never [`TokenError::Expired`].

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
  #[error("malformed token: {0}")]
  Malformed(String),

  #[error("token expired at {expired_at}")]
  Expired { expired_at: DateTime<Utc> },

  #[error("could not encode token: {0}")]
  Encode(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
  sub: String,
  iat: i64,
  exp: i64,
}

/// The verified content of a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
  pub subject:    String,
  pub expires_at: DateTime<Utc>,
}

/// Issues and verifies tokens under one shared secret.
#[derive(Clone)]
pub struct TokenCodec {
  encoding:   EncodingKey,
  decoding:   DecodingKey,
  validation: Validation,
}

impl std::fmt::Debug for TokenCodec {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TokenCodec").finish_non_exhaustive()
  }
}

impl TokenCodec {
  pub fn new(secret: &[u8]) -> Self {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.set_required_spec_claims(&["exp", "sub"]);

    Self {
      encoding: EncodingKey::from_secret(secret),
      decoding: DecodingKey::from_secret(secret),
      validation,
    }
  }

  pub fn issue(&self, subject: &str, ttl: Duration) -> Result<String, TokenError> {
    self.issue_at(subject, ttl, Utc::now())
  }

  /// Issue a token expiring at `now + ttl`, rounded up to the next second.
  pub fn issue_at(
    &self,
    subject: &str,
    ttl: Duration,
    now: DateTime<Utc>,
  ) -> Result<String, TokenError> {
    let deadline = now
      .checked_add_signed(ttl)
      .ok_or_else(|| TokenError::Encode(format!("ttl {ttl} overflows the deadline")))?;
    let exp = deadline.timestamp() + i64::from(deadline.timestamp_subsec_nanos() > 0);
    let claims = Claims { sub: subject.to_owned(), iat: now.timestamp(), exp };

    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
      .map_err(|e| TokenError::Encode(e.to_string()))
  }

  pub fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
    self.verify_at(token, Utc::now())
  }

  pub fn verify_at(
    &self,
    token: &str,
    now: DateTime<Utc>,
  ) -> Result<VerifiedToken, TokenError> {
    let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
      .map_err(|e| TokenError::Malformed(e.to_string()))?;

    let expires_at = DateTime::from_timestamp(data.claims.exp, 0)
      .ok_or_else(|| TokenError::Malformed(format!("exp out of range: {}", data.claims.exp)))?;

    if now >= expires_at {
      return Err(TokenError::Expired { expired_at: expires_at });
    }

    Ok(VerifiedToken { subject: data.claims.sub, expires_at })
  }

  /// `Ok(true)` for a genuine but expired token. A token whose signature
  /// does not verify is an error, not "unexpired".
  pub fn is_expired(&self, token: &str) -> Result<bool, TokenError> {
    match self.verify(token) {
      Ok(_) => Ok(false),
      Err(TokenError::Expired { .. }) => Ok(true),
      Err(e) => Err(e),
    }
  }

  pub fn subject_of(&self, token: &str) -> Result<String, TokenError> {
    self.verify(token).map(|v| v.subject)
  }
}
