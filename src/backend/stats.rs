//! Per-backend call counters.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

/// Counters shared by every call on one backend instance.
#[derive(Debug, Default)]
pub struct CallStats {
  resolve_calls: AtomicU32,
  lookup_calls: AtomicU32,
  lookup_users: AtomicU32,
  check_calls: AtomicU32,
  lookup_errors: AtomicU32,
  check_errors: AtomicU32,
}

/// Point-in-time copy of [CallStats].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
  pub resolve_calls: u32,
  pub lookup_calls: u32,
  pub lookup_users: u32,
  pub check_calls: u32,
  pub lookup_errors: u32,
  pub check_errors: u32,
}

impl CallStats {
  pub fn new() -> Self {
    Self::default()
  }

  pub(crate) fn record_resolve(&self) {
    self.resolve_calls.fetch_add(1, Ordering::Relaxed);
  }

  pub(crate) fn record_lookup(&self, users: usize) {
    self.lookup_calls.fetch_add(1, Ordering::Relaxed);
    self
      .lookup_users
      .fetch_add(u32::try_from(users).unwrap_or(u32::MAX), Ordering::Relaxed);
  }

  pub(crate) fn record_lookup_error(&self) {
    self.lookup_errors.fetch_add(1, Ordering::Relaxed);
  }

  pub(crate) fn record_check(&self) {
    self.check_calls.fetch_add(1, Ordering::Relaxed);
  }

  pub(crate) fn record_check_error(&self) {
    self.check_errors.fetch_add(1, Ordering::Relaxed);
  }

  pub fn snapshot(&self) -> StatsSnapshot {
    StatsSnapshot {
      resolve_calls: self.resolve_calls.load(Ordering::Relaxed),
      lookup_calls: self.lookup_calls.load(Ordering::Relaxed),
      lookup_users: self.lookup_users.load(Ordering::Relaxed),
      check_calls: self.check_calls.load(Ordering::Relaxed),
      lookup_errors: self.lookup_errors.load(Ordering::Relaxed),
      check_errors: self.check_errors.load(Ordering::Relaxed),
    }
  }
}
