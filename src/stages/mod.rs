//! Stages of the spam-checking workflow.
//!
//! keys → [SelectUsers] → [SelectMessages] → [CheckSpam] → [CombineResults] → records

mod check_spam;
mod combine_results;
mod select_messages;
mod select_users;
#[cfg(test)]
pub(crate) mod test_support;

pub use check_spam::CheckSpam;
pub use combine_results::{CombineResults, sort_for_report};
pub use select_messages::SelectMessages;
pub use select_users::SelectUsers;

use crate::backend::Backend;
use crate::config::SpamCheckConfig;
use crate::pipeline::Pipeline;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Appends the four spam-checking stages to a pipeline of user keys.
pub fn spam_pipeline<B>(
  keys: Pipeline<String>,
  backend: Arc<B>,
  config: &SpamCheckConfig,
) -> Pipeline<String>
where
  B: Backend + ?Sized,
{
  keys
    .stage(SelectUsers::new(Arc::clone(&backend)))
    .stage(SelectMessages::new(Arc::clone(&backend), config.batch_size))
    .stage(CheckSpam::new(backend, config.max_in_flight))
    .stage(CombineResults::new())
}

/// Waits for every worker a stage spawned. A worker panic is re-raised.
pub(crate) async fn join_workers(mut workers: JoinSet<()>) {
  while let Some(joined) = workers.join_next().await {
    if let Err(e) = joined
      && e.is_panic()
    {
      std::panic::resume_unwind(e.into_panic());
    }
  }
}
