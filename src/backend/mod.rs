//! Backend contracts the stages call into, plus an in-process simulation.
//!
//! The stages only see the [Backend] trait. [SimulatedBackend] models the real
//! services by latency, batch limits and admission failures.

use crate::types::{MessageId, User};
use async_trait::async_trait;

mod error;
mod simulated;
#[cfg(test)]
mod simulated_test;
mod stats;

pub use error::BackendError;
pub use simulated::{SimulatedBackend, resolve_alias, user_id};
pub use stats::{CallStats, StatsSnapshot};

/// Services consumed by the spam-checking stages.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
  /// Resolves a user key (an email) to a user. Never fails.
  async fn resolve_user(&self, key: &str) -> User;

  /// Fetches message ids for a batch of users.
  async fn lookup_messages(&self, users: &[User]) -> Result<Vec<MessageId>, BackendError>;

  /// Checks one message for spam.
  async fn check_spam(&self, id: MessageId) -> Result<bool, BackendError>;
}
