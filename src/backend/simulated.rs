//! In-process stand-in for the user, message and antispam services.

use super::{Backend, BackendError, CallStats};
use crate::config::SpamCheckConfig;
use crate::types::{MessageId, User};
use async_trait::async_trait;
use crc::{CRC_64_GO_ISO, Crc};
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tracing::{debug, instrument, warn};

const USER_ID_HASH: Crc<u64> = Crc::<u64>::new(&CRC_64_GO_ISO);

/// Keys that belong to the same account as another key.
static ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
  HashMap::from([
    ("batman@mail.ru", "bruce.wayne@mail.ru"),
    ("spiderman@mail.ru", "peter.parker@mail.ru"),
  ])
});

/// Canonical email for `key`.
pub fn resolve_alias(key: &str) -> &str {
  ALIASES.get(key).copied().unwrap_or(key)
}

/// User id the simulated directory assigns to a canonical email (CRC-64/ISO).
pub fn user_id(email: &str) -> u64 {
  USER_ID_HASH.checksum(email.as_bytes())
}

/// Simulated backend. Deterministic in its answers, timed with tokio's clock so
/// tests can run it in paused time.
#[derive(Debug)]
pub struct SimulatedBackend {
  resolve_latency: Duration,
  lookup_latency: Duration,
  check_latency: Duration,
  max_users_batch: usize,
  max_concurrent_checks: usize,
  checks_in_flight: AtomicUsize,
  stats: Arc<CallStats>,
}

impl Default for SimulatedBackend {
  fn default() -> Self {
    Self::from_config(&SpamCheckConfig::default())
  }
}

impl SimulatedBackend {
  pub fn from_config(config: &SpamCheckConfig) -> Self {
    Self {
      resolve_latency: config.resolve_latency(),
      lookup_latency: config.lookup_latency(),
      check_latency: config.check_latency(),
      max_users_batch: config.max_users_batch,
      max_concurrent_checks: config.max_concurrent_checks,
      checks_in_flight: AtomicUsize::new(0),
      stats: Arc::new(CallStats::new()),
    }
  }

  /// Counters for every call made on this backend.
  pub fn stats(&self) -> &Arc<CallStats> {
    &self.stats
  }

  pub fn max_users_batch(&self) -> usize {
    self.max_users_batch
  }
}

/// Holds one antispam admission slot until dropped.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
  fn drop(&mut self) {
    self.0.fetch_sub(1, Ordering::SeqCst);
  }
}

#[async_trait]
impl Backend for SimulatedBackend {
  #[instrument(level = "trace", skip(self))]
  async fn resolve_user(&self, key: &str) -> User {
    let start = Instant::now();
    self.stats.record_resolve();
    sleep(self.resolve_latency).await;

    let email = resolve_alias(key);
    let user = User::new(user_id(email), email);
    debug!(elapsed = ?start.elapsed(), key, user = %user, "resolve_user");
    user
  }

  #[instrument(level = "trace", skip(self, users), fields(users = users.len()))]
  async fn lookup_messages(&self, users: &[User]) -> Result<Vec<MessageId>, BackendError> {
    let start = Instant::now();
    self.stats.record_lookup(users.len());
    sleep(self.lookup_latency).await;

    if users.len() > self.max_users_batch {
      self.stats.record_lookup_error();
      warn!(len = users.len(), max = self.max_users_batch, "too many users in one batch");
      return Err(BackendError::BatchTooLarge {
        len: users.len(),
        max: self.max_users_batch,
      });
    }

    let mut messages = Vec::with_capacity(10 * users.len());
    for user in users {
      let mut rng = StdRng::seed_from_u64(user.id);
      let n = rng.gen_range(0..10);
      for _ in 0..=n {
        messages.push(MessageId(rng.next_u64()));
      }
    }
    debug!(elapsed = ?start.elapsed(), messages = messages.len(), "lookup_messages");
    Ok(messages)
  }

  #[instrument(level = "trace", skip(self))]
  async fn check_spam(&self, id: MessageId) -> Result<bool, BackendError> {
    let start = Instant::now();
    self.stats.record_check();

    let already = self.checks_in_flight.fetch_add(1, Ordering::SeqCst);
    let _slot = InFlight(&self.checks_in_flight);
    let admitted = already < self.max_concurrent_checks;
    sleep(self.check_latency).await;

    if !admitted {
      self.stats.record_check_error();
      warn!(%id, "antispam rejected request: too many concurrent requests");
      return Err(BackendError::TooManyRequests {
        reported_spam: true,
      });
    }

    let has_spam = StdRng::seed_from_u64(id.0).gen_bool(0.5);
    debug!(elapsed = ?start.elapsed(), %id, has_spam, "check_spam");
    Ok(has_spam)
  }
}
