//! Backend call failures. All of them are non-fatal: the affected items are dropped.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
  /// The batched message lookup was given more users than it accepts.
  #[error("too many users in one batch: {len} > {max}")]
  BatchTooLarge { len: usize, max: usize },

  /// The spam checker rejected the call for exceeding its concurrency limit.
  /// `reported_spam` is the flag sent along with the rejection; it carries no
  /// information about the message.
  #[error("too many concurrent requests")]
  TooManyRequests { reported_spam: bool },
}
