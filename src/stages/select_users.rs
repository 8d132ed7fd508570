//! Resolves user keys concurrently and emits every user id at most once.

use super::join_workers;
use crate::backend::Backend;
use crate::pipeline::Stage;
use crate::stream::{Inlet, Outlet};
use crate::types::User;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::trace;

/// One resolution task per key, no concurrency bound. Only the
/// check-and-emit step is serialised, so aliasing keys race for the single slot.
pub struct SelectUsers<B: ?Sized> {
  backend: Arc<B>,
}

impl<B: Backend + ?Sized> SelectUsers<B> {
  pub fn new(backend: Arc<B>) -> Self {
    Self { backend }
  }
}

#[async_trait]
impl<B: Backend + ?Sized> Stage<String, User> for SelectUsers<B> {
  fn name(&self) -> &str {
    "select_users"
  }

  async fn run(&self, mut input: Inlet<String>, output: Outlet<User>) {
    let seen: Arc<Mutex<HashSet<u64>>> = Arc::default();
    let mut workers = JoinSet::new();

    while let Some(key) = input.recv().await {
      let backend = Arc::clone(&self.backend);
      let seen = Arc::clone(&seen);
      let output = output.clone();
      workers.spawn(async move {
        let user = backend.resolve_user(&key).await;
        let mut seen = seen.lock().await;
        if seen.insert(user.id) {
          output.send(user);
        } else {
          trace!(key = %key, id = user.id, "duplicate user dropped");
        }
      });
    }

    join_workers(workers).await;
  }
}
