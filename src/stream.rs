//! Typed links between pipeline stages.
//!
//! A link is an unbounded single-consumer channel. The write end ([Outlet]) can be
//! cloned into a stage's worker tasks, but only the executor may mark the link
//! complete. Writing to a completed link is a broken stage, not a data condition,
//! and panics.

use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Sender the caller uses to feed the first link of a pipeline.
/// Dropping every clone completes the input.
pub type Feed<T> = mpsc::UnboundedSender<T>;

/// Allocates one link.
pub fn link<T>() -> (Outlet<T>, Inlet<T>) {
  let (tx, rx) = mpsc::unbounded_channel();
  (Outlet::new(tx), Inlet::new(rx))
}

/// Write end of a link.
pub struct Outlet<T> {
  tx: Arc<Mutex<Option<mpsc::UnboundedSender<T>>>>,
}

impl<T> Clone for Outlet<T> {
  fn clone(&self) -> Self {
    Self {
      tx: Arc::clone(&self.tx),
    }
  }
}

impl<T> Outlet<T> {
  fn new(tx: mpsc::UnboundedSender<T>) -> Self {
    Self {
      tx: Arc::new(Mutex::new(Some(tx))),
    }
  }

  fn slot(&self) -> MutexGuard<'_, Option<mpsc::UnboundedSender<T>>> {
    self.tx.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Sends one item downstream. Never blocks.
  ///
  /// # Panics
  ///
  /// If the link was already completed, i.e. the owning stage returned and one of
  /// its tasks kept writing.
  pub fn send(&self, item: T) {
    let slot = self.slot();
    if let Some(tx) = slot.as_ref() {
      // The consumer may have stopped reading; that is not the producer's error.
      let _ = tx.send(item);
      return;
    }
    drop(slot);
    tracing::error!("send on a completed link");
    panic!("stage wrote to its output after returning");
  }

  /// True once the executor has completed this link.
  pub fn is_closed(&self) -> bool {
    self.slot().is_none()
  }

  /// Marks the link complete. Called by the executor exactly once per link.
  pub(crate) fn close(&self) {
    if self.slot().take().is_none() {
      tracing::error!("link completed twice");
      panic!("link completed twice");
    }
  }
}

/// Completes the wrapped link when dropped, on every exit path of a stage.
pub(crate) struct CompletionGuard<T>(Outlet<T>);

impl<T> CompletionGuard<T> {
  pub(crate) fn new(outlet: Outlet<T>) -> Self {
    Self(outlet)
  }
}

impl<T> Drop for CompletionGuard<T> {
  fn drop(&mut self) {
    if std::thread::panicking() && self.0.is_closed() {
      return;
    }
    self.0.close();
  }
}

/// Read end of a link. Yields `None` once the producer stage has finished.
pub struct Inlet<T> {
  inner: UnboundedReceiverStream<T>,
}

impl<T> Inlet<T> {
  fn new(rx: mpsc::UnboundedReceiver<T>) -> Self {
    Self {
      inner: UnboundedReceiverStream::new(rx),
    }
  }

  /// Receives the next item, or `None` at end of sequence.
  pub async fn recv(&mut self) -> Option<T> {
    self.inner.next().await
  }

  /// Drains the link to completion.
  pub async fn collect_all(mut self) -> Vec<T> {
    let mut out = Vec::new();
    while let Some(item) = self.recv().await {
      out.push(item);
    }
    out
  }
}

impl<T> Stream for Inlet<T> {
  type Item = T;

  fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
    Pin::new(&mut self.inner).poll_next(cx)
  }
}

impl<T> From<mpsc::UnboundedReceiver<T>> for Inlet<T> {
  fn from(rx: mpsc::UnboundedReceiver<T>) -> Self {
    Self::new(rx)
  }
}
