//! Run configuration: defaults, JSON file, `SPAMFLOW_*` environment overrides.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::instrument;

/// Environment variable prefix for overrides, e.g. `SPAMFLOW_BATCH_SIZE=3`.
pub const ENV_PREFIX: &str = "SPAMFLOW_";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("reading config: {0}")]
  Io(#[from] std::io::Error),
  #[error("parsing config: {0}")]
  Parse(#[from] serde_json::Error),
  #[error("invalid value for {key}: {reason}")]
  InvalidValue { key: String, reason: String },
}

/// Knobs for the stages and for the simulated backend.
///
/// Stage limits (`batch_size`, `max_in_flight`) and backend limits
/// (`max_users_batch`, `max_concurrent_checks`) are separate so a misconfigured
/// stage can be observed against the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SpamCheckConfig {
  /// Users per batched message lookup issued by the batching stage.
  pub batch_size: usize,
  /// Concurrent spam checks admitted by the spam-check stage.
  pub max_in_flight: usize,
  /// Largest batch the message service accepts.
  pub max_users_batch: usize,
  /// Concurrent requests the antispam service accepts before rejecting.
  pub max_concurrent_checks: usize,
  pub resolve_latency_ms: u64,
  pub lookup_latency_ms: u64,
  pub check_latency_ms: u64,
}

impl Default for SpamCheckConfig {
  fn default() -> Self {
    Self {
      batch_size: 2,
      max_in_flight: 5,
      max_users_batch: 2,
      max_concurrent_checks: 5,
      resolve_latency_ms: 1000,
      lookup_latency_ms: 1000,
      check_latency_ms: 100,
    }
  }
}

impl SpamCheckConfig {
  /// Loads a JSON config file. Missing fields take their defaults.
  #[instrument(level = "trace")]
  pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
    let bytes = std::fs::read(path)?;
    let config: Self = serde_json::from_slice(&bytes)?;
    Ok(config)
  }

  /// Applies `SPAMFLOW_*` overrides from the process environment.
  pub fn apply_env(&mut self) -> Result<(), ConfigError> {
    self.apply_vars(std::env::vars())
  }

  /// Applies overrides from `(name, value)` pairs; names without the prefix are ignored.
  pub fn apply_vars<I, K, V>(&mut self, vars: I) -> Result<(), ConfigError>
  where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
  {
    for (name, value) in vars {
      let Some(key) = name.as_ref().strip_prefix(ENV_PREFIX) else {
        continue;
      };
      let value = value.as_ref();
      match key {
        "BATCH_SIZE" => self.batch_size = parse(key, value)?,
        "MAX_IN_FLIGHT" => self.max_in_flight = parse(key, value)?,
        "MAX_USERS_BATCH" => self.max_users_batch = parse(key, value)?,
        "MAX_CONCURRENT_CHECKS" => self.max_concurrent_checks = parse(key, value)?,
        "RESOLVE_LATENCY_MS" => self.resolve_latency_ms = parse(key, value)?,
        "LOOKUP_LATENCY_MS" => self.lookup_latency_ms = parse(key, value)?,
        "CHECK_LATENCY_MS" => self.check_latency_ms = parse(key, value)?,
        other => tracing::debug!(var = other, "ignoring unknown override"),
      }
    }
    Ok(())
  }

  /// Rejects limits that would stall a stage.
  pub fn validate(&self) -> Result<(), ConfigError> {
    for (key, v) in [
      ("batch_size", self.batch_size),
      ("max_in_flight", self.max_in_flight),
    ] {
      if v == 0 {
        return Err(ConfigError::InvalidValue {
          key: key.to_string(),
          reason: "must be at least 1".to_string(),
        });
      }
    }
    Ok(())
  }

  pub fn resolve_latency(&self) -> Duration {
    Duration::from_millis(self.resolve_latency_ms)
  }

  pub fn lookup_latency(&self) -> Duration {
    Duration::from_millis(self.lookup_latency_ms)
  }

  pub fn check_latency(&self) -> Duration {
    Duration::from_millis(self.check_latency_ms)
  }

  /// All backend latencies set to zero; limits unchanged.
  pub fn without_latency(mut self) -> Self {
    self.resolve_latency_ms = 0;
    self.lookup_latency_ms = 0;
    self.check_latency_ms = 0;
    self
  }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError>
where
  T::Err: std::fmt::Display,
{
  value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
    key: format!("{ENV_PREFIX}{key}"),
    reason: e.to_string(),
  })
}
