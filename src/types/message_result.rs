//! Outcome of a spam check on one message.

use super::MessageId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Result of checking a single message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageResult {
  pub id: MessageId,
  pub has_spam: bool,
}

impl MessageResult {
  pub fn new(id: impl Into<MessageId>, has_spam: bool) -> Self {
    Self {
      id: id.into(),
      has_spam,
    }
  }

  /// Report order: spam first, then ascending id.
  pub fn report_order(&self, other: &Self) -> Ordering {
    other
      .has_spam
      .cmp(&self.has_spam)
      .then_with(|| self.id.cmp(&other.id))
  }
}

/// Formats as the output record `"<has_spam> <id>"`, e.g. `true 42`.
impl fmt::Display for MessageResult {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.has_spam, self.id)
  }
}
