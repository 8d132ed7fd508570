//! Scripted backend for stage tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::backend::{Backend, BackendError, resolve_alias, user_id};
use crate::types::{MessageId, User};

/// Resolves like the simulated directory, returns two messages per user
/// (`id * 10` and `id * 10 + 1`), and records batch sizes and check concurrency.
#[derive(Debug, Default)]
pub(crate) struct ScriptedBackend {
  pub max_batch: Option<usize>,
  pub check_latency: Duration,
  /// Checks for ids divisible by this are rejected as over-limit.
  pub reject_every: Option<u64>,
  pub batches: Mutex<Vec<usize>>,
  pub in_flight: AtomicUsize,
  pub peak_in_flight: AtomicUsize,
}

impl ScriptedBackend {
  pub fn batch_sizes(&self) -> Vec<usize> {
    let mut sizes = self.batches.lock().unwrap().clone();
    sizes.sort_unstable();
    sizes
  }

  pub fn peak(&self) -> usize {
    self.peak_in_flight.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl Backend for ScriptedBackend {
  async fn resolve_user(&self, key: &str) -> User {
    tokio::task::yield_now().await;
    let email = resolve_alias(key);
    User::new(user_id(email), email)
  }

  async fn lookup_messages(&self, users: &[User]) -> Result<Vec<MessageId>, BackendError> {
    self.batches.lock().unwrap().push(users.len());
    tokio::task::yield_now().await;
    if let Some(max) = self.max_batch
      && users.len() > max
    {
      return Err(BackendError::BatchTooLarge {
        len: users.len(),
        max,
      });
    }
    Ok(
      users
        .iter()
        .flat_map(|u| {
          let base = u.id.wrapping_mul(10);
          [MessageId(base), MessageId(base.wrapping_add(1))]
        })
        .collect(),
    )
  }

  async fn check_spam(&self, id: MessageId) -> Result<bool, BackendError> {
    let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
    tokio::time::sleep(self.check_latency).await;
    self.in_flight.fetch_sub(1, Ordering::SeqCst);
    if self.reject_every.is_some_and(|n| id.0 % n == 0) {
      return Err(BackendError::TooManyRequests {
        reported_spam: true,
      });
    }
    Ok(id.0 % 2 == 0)
  }
}
