//! Runtime configuration, read from `config.toml` and `MURMUR_*` variables.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, bail};
use serde::Deserialize;

/// Thirty days, matching the lifetime of a login session.
const DEFAULT_TOKEN_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Ten years.
const MAX_TOKEN_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:           String,
  #[serde(default = "default_port")]
  pub port:           u16,
  #[serde(default = "default_store_path")]
  pub store_path:     PathBuf,
  /// HMAC secret for bearer tokens. Rotating it signs everyone out.
  pub token_secret:   String,
  #[serde(default = "default_token_ttl_secs")]
  pub token_ttl_secs: i64,
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/murmur/murmur.db") }

fn default_token_ttl_secs() -> i64 { DEFAULT_TOKEN_TTL_SECS }

impl ServerConfig {
  /// Layer `path` (optional) under `MURMUR_*` environment variables.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("MURMUR"))
      .build()
      .context("failed to read config file")?;

    Self::from_settings(settings)
  }

  fn from_settings(settings: config::Config) -> anyhow::Result<Self> {
    let cfg: ServerConfig = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    cfg.validate()?;
    Ok(cfg)
  }

  fn validate(&self) -> anyhow::Result<()> {
    if self.token_secret.trim().is_empty() {
      bail!("token_secret must not be empty");
    }
    if !(1..=MAX_TOKEN_TTL_SECS).contains(&self.token_ttl_secs) {
      bail!(
        "token_ttl_secs must be between 1 and {MAX_TOKEN_TTL_SECS}, got {}",
        self.token_ttl_secs
      );
    }
    Ok(())
  }

  pub fn token_ttl(&self) -> anyhow::Result<chrono::Duration> {
    chrono::Duration::try_seconds(self.token_ttl_secs)
      .with_context(|| format!("token_ttl_secs out of range: {}", self.token_ttl_secs))
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
