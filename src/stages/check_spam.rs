//! Checks every message for spam under a per-stage concurrency gate.

use super::join_workers;
use crate::backend::{Backend, BackendError};
use crate::pipeline::Stage;
use crate::stream::{Inlet, Outlet};
use crate::types::{MessageId, MessageResult};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Launches one task per message immediately; at most `max_in_flight` of them
/// call the backend at once. Failed checks are dropped.
///
/// A `TooManyRequests` rejection arrives with `reported_spam = true`. That flag
/// is not a verdict and is discarded with the rest of the failure; the message
/// does not appear in the output.
pub struct CheckSpam<B: ?Sized> {
  backend: Arc<B>,
  max_in_flight: usize,
}

impl<B: Backend + ?Sized> CheckSpam<B> {
  /// A `max_in_flight` of zero is treated as one.
  pub fn new(backend: Arc<B>, max_in_flight: usize) -> Self {
    Self {
      backend,
      max_in_flight: max_in_flight.max(1),
    }
  }

  pub fn max_in_flight(&self) -> usize {
    self.max_in_flight
  }
}

#[async_trait]
impl<B: Backend + ?Sized> Stage<MessageId, MessageResult> for CheckSpam<B> {
  fn name(&self) -> &str {
    "check_spam"
  }

  async fn run(&self, mut input: Inlet<MessageId>, output: Outlet<MessageResult>) {
    let gate = Arc::new(Semaphore::new(self.max_in_flight));
    let mut workers = JoinSet::new();

    while let Some(id) = input.recv().await {
      let backend = Arc::clone(&self.backend);
      let gate = Arc::clone(&gate);
      let output = output.clone();
      workers.spawn(async move {
        // The gate is never closed.
        let Ok(permit) = gate.acquire_owned().await else {
          return;
        };
        let checked = backend.check_spam(id).await;
        drop(permit);
        match checked {
          Ok(has_spam) => output.send(MessageResult { id, has_spam }),
          Err(BackendError::TooManyRequests { reported_spam }) => {
            debug!(%id, reported_spam, "spam check rejected, message dropped")
          }
          Err(e) => warn!(%id, error = %e, "spam check failed, message dropped"),
        }
      });
    }

    join_workers(workers).await;
  }
}
