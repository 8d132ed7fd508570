//! # spamflow
//!
//! Typed concurrent stage pipelines, and a spam-checking workflow built on them.
//!
//! ## Architecture
//!
//! - [stream]: typed links between stages; only the executor completes a link.
//! - [pipeline]: the [Stage] trait and the [Pipeline] executor, which runs every
//!   stage as its own task and joins them all.
//! - [stages]: dedup fan-out, size-triggered batching, gated fan-out, and a
//!   sorting barrier.
//! - [backend]: the services the stages call, with a simulated implementation.
//!
//! ```no_run
//! use std::sync::Arc;
//! use spamflow::{Pipeline, SimulatedBackend, SpamCheckConfig, spam_pipeline};
//!
//! # async fn demo() {
//! let config = SpamCheckConfig::default();
//! let backend = Arc::new(SimulatedBackend::from_config(&config));
//! let keys = Pipeline::from_iter(vec!["batman@mail.ru".to_string()]);
//! for record in spam_pipeline(keys, backend, &config).collect().await {
//!   println!("{record}");
//! }
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod pipeline;
pub mod stages;
pub mod stream;
#[cfg(test)]
mod stream_test;
pub mod types;

pub use backend::{Backend, BackendError, CallStats, SimulatedBackend, StatsSnapshot};
pub use config::{ConfigError, SpamCheckConfig};
pub use pipeline::{Pipeline, Stage, from_fn};
pub use stages::{CheckSpam, CombineResults, SelectMessages, SelectUsers, spam_pipeline};
pub use stream::{Feed, Inlet, Outlet};
pub use types::{MessageId, MessageResult, User};
