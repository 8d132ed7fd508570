//! Full barrier: collects every result, sorts, emits report records.

use crate::pipeline::Stage;
use crate::stream::{Inlet, Outlet};
use crate::types::MessageResult;
use async_trait::async_trait;
use tracing::debug;

/// Emits `"<has_spam> <id>"` records, spam first, each block by ascending id.
/// Nothing is emitted before the input is complete.
#[derive(Debug, Default)]
pub struct CombineResults;

impl CombineResults {
  pub fn new() -> Self {
    Self
  }
}

/// Sorts results into report order.
pub fn sort_for_report(results: &mut [MessageResult]) {
  results.sort_unstable_by(MessageResult::report_order);
}

#[async_trait]
impl Stage<MessageResult, String> for CombineResults {
  fn name(&self) -> &str {
    "combine_results"
  }

  async fn run(&self, input: Inlet<MessageResult>, output: Outlet<String>) {
    let mut results = input.collect_all().await;
    sort_for_report(&mut results);
    debug!(results = results.len(), "emitting sorted results");
    for r in results {
      output.send(r.to_string());
    }
  }
}
