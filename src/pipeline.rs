//! Pipeline executor: chains typed stages and drives them to completion.
//!
//! - [Stage]: one unit of work, reading an [Inlet] and writing an [Outlet].
//! - [Pipeline]: builder that allocates one link per stage (N stages ⇒ N+1 links)
//!   and, on [Pipeline::run], launches every stage as its own task.
//!
//! A stage never completes its own output. The executor does it right after the
//! stage's `run` returns (or unwinds), so the next stage sees end-of-sequence only
//! once every item has been sent.

use crate::stream::{CompletionGuard, Feed, Inlet, Outlet, link};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::future::Future;
use std::marker::PhantomData;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, instrument};

/// One stage of a pipeline.
///
/// `run` must consume its input and return only after everything it intends to
/// emit has been sent; tasks it spawns must be joined before it returns.
#[async_trait]
pub trait Stage<I, O>: Send + Sync + 'static
where
  I: Send + 'static,
  O: Send + 'static,
{
  fn name(&self) -> &str;

  async fn run(&self, input: Inlet<I>, output: Outlet<O>);
}

/// Stage backed by an async closure. See [from_fn].
pub struct FnStage<F, I, O> {
  name: String,
  f: F,
  _marker: PhantomData<fn(I) -> O>,
}

/// Adapts `f(input, output)` into a [Stage].
pub fn from_fn<I, O, F, Fut>(name: impl Into<String>, f: F) -> FnStage<F, I, O>
where
  F: Fn(Inlet<I>, Outlet<O>) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = ()> + Send + 'static,
{
  FnStage {
    name: name.into(),
    f,
    _marker: PhantomData,
  }
}

#[async_trait]
impl<I, O, F, Fut> Stage<I, O> for FnStage<F, I, O>
where
  I: Send + 'static,
  O: Send + 'static,
  F: Fn(Inlet<I>, Outlet<O>) -> Fut + Send + Sync + 'static,
  Fut: Future<Output = ()> + Send + 'static,
{
  fn name(&self) -> &str {
    &self.name
  }

  async fn run(&self, input: Inlet<I>, output: Outlet<O>) {
    (self.f)(input, output).await
  }
}

/// A stage bound to its links, not yet started.
struct Launch {
  name: String,
  task: BoxFuture<'static, ()>,
}

/// Ordered chain of stages whose last link carries `T`.
pub struct Pipeline<T> {
  tail: Inlet<T>,
  launches: Vec<Launch>,
}

impl<T: Send + 'static> Pipeline<T> {
  /// Allocates the initial link. The caller feeds it through the returned
  /// [Feed] and completes it by dropping the feed; [Pipeline::run] does not
  /// return before that happens.
  pub fn new() -> (Feed<T>, Self) {
    let (tx, rx) = mpsc::unbounded_channel();
    let pipeline = Self {
      tail: Inlet::from(rx),
      launches: Vec::new(),
    };
    (tx, pipeline)
  }

  /// Appends a stage reading this pipeline's last link.
  pub fn stage<O, S>(self, stage: S) -> Pipeline<O>
  where
    O: Send + 'static,
    S: Stage<T, O>,
  {
    let (outlet, inlet) = link::<O>();
    let name = stage.name().to_string();
    let input = self.tail;
    let task: BoxFuture<'static, ()> = Box::pin(async move {
      let _complete = CompletionGuard::new(outlet.clone());
      stage.run(input, outlet).await;
    });
    let mut launches = self.launches;
    launches.push(Launch { name, task });
    Pipeline {
      tail: inlet,
      launches,
    }
  }

  /// Number of stages appended so far.
  pub fn len(&self) -> usize {
    self.launches.len()
  }

  pub fn is_empty(&self) -> bool {
    self.launches.is_empty()
  }

  /// Launches all stages concurrently and waits until every one has returned.
  /// Returns the last link, complete and holding everything the final stage emitted.
  ///
  /// There is no cancellation: each stage runs to natural completion.
  ///
  /// # Panics
  ///
  /// Re-raises the first stage panic once all stages have finished.
  #[instrument(level = "debug", skip(self), fields(stages = self.launches.len()))]
  pub async fn run(self) -> Inlet<T> {
    let mut tasks = JoinSet::new();
    for Launch { name, task } in self.launches {
      let span = tracing::debug_span!("stage", stage = %name);
      tasks.spawn(
        async move {
          debug!("stage started");
          task.await;
          debug!("stage finished");
        }
        .instrument(span),
      );
    }

    let mut first_panic = None;
    while let Some(joined) = tasks.join_next().await {
      if let Err(e) = joined
        && e.is_panic()
      {
        tracing::error!(error = %e, "stage panicked");
        first_panic.get_or_insert(e.into_panic());
      }
    }
    if let Some(payload) = first_panic {
      std::panic::resume_unwind(payload);
    }
    debug!("pipeline drained");
    self.tail
  }

  /// Runs the pipeline and collects the final link.
  pub async fn collect(self) -> Vec<T> {
    self.run().await.collect_all().await
  }
}

/// Pipeline whose initial link holds the items and is already complete.
impl<T: Send + 'static> FromIterator<T> for Pipeline<T> {
  fn from_iter<It: IntoIterator<Item = T>>(items: It) -> Self {
    let (feed, pipeline) = Self::new();
    for item in items {
      // The receiver lives in `pipeline`; this cannot fail.
      let _ = feed.send(item);
    }
    pipeline
  }
}
