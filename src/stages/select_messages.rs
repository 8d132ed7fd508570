//! Groups users into fixed-size batches and looks up their messages.

use super::join_workers;
use crate::backend::Backend;
use crate::pipeline::Stage;
use crate::stream::{Inlet, Outlet};
use crate::types::{MessageId, User};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Issues one lookup per `batch_size` users as soon as a batch fills, plus one
/// for a non-empty remainder at end of input. Lookups run concurrently and
/// without bound. A failed lookup contributes nothing.
pub struct SelectMessages<B: ?Sized> {
  backend: Arc<B>,
  batch_size: usize,
}

impl<B: Backend + ?Sized> SelectMessages<B> {
  /// A `batch_size` of zero is treated as one.
  pub fn new(backend: Arc<B>, batch_size: usize) -> Self {
    Self {
      backend,
      batch_size: batch_size.max(1),
    }
  }

  pub fn batch_size(&self) -> usize {
    self.batch_size
  }

  fn launch(&self, workers: &mut JoinSet<()>, output: &Outlet<MessageId>, batch: Vec<User>) {
    debug!(users = batch.len(), "launching message lookup");
    let backend = Arc::clone(&self.backend);
    let output = output.clone();
    workers.spawn(async move {
      match backend.lookup_messages(&batch).await {
        Ok(ids) => {
          for id in ids {
            output.send(id);
          }
        }
        Err(e) => warn!(error = %e, users = batch.len(), "message lookup failed, batch dropped"),
      }
    });
  }
}

#[async_trait]
impl<B: Backend + ?Sized> Stage<User, MessageId> for SelectMessages<B> {
  fn name(&self) -> &str {
    "select_messages"
  }

  async fn run(&self, mut input: Inlet<User>, output: Outlet<MessageId>) {
    let mut workers = JoinSet::new();
    let mut batch = Vec::with_capacity(self.batch_size);

    while let Some(user) = input.recv().await {
      batch.push(user);
      if batch.len() == self.batch_size {
        let full = std::mem::replace(&mut batch, Vec::with_capacity(self.batch_size));
        self.launch(&mut workers, &output, full);
      }
    }
    if !batch.is_empty() {
      self.launch(&mut workers, &output, batch);
    }

    join_workers(workers).await;
  }
}
