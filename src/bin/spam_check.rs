//! CLI: run the spam-checking pipeline against the simulated backend.
//!
//! Usage: `spam_check [OPTIONS] [KEYS]...`
//! Example: spam_check batman@mail.ru bruce.wayne@mail.ru
//!
//! With no KEYS, keys are read from stdin, one per line.
//! Set RUST_LOG=spamflow=debug to see every backend call.

use clap::Parser;
use spamflow::{Pipeline, SimulatedBackend, SpamCheckConfig, spam_pipeline};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Check users' messages for spam.
///
/// Precedence: SPAMFLOW_* environment variables, then flags, then --config, then defaults.
#[derive(Parser, Debug)]
#[command(name = "spam_check")]
#[command(
  after_help = r#"Environment variables (override flags and --config when set):
  SPAMFLOW_BATCH_SIZE             Users per message lookup.
  SPAMFLOW_MAX_IN_FLIGHT          Concurrent spam checks issued.
  SPAMFLOW_MAX_USERS_BATCH        Batch limit of the simulated message service.
  SPAMFLOW_MAX_CONCURRENT_CHECKS  Concurrency limit of the simulated antispam.
  SPAMFLOW_RESOLVE_LATENCY_MS, SPAMFLOW_LOOKUP_LATENCY_MS, SPAMFLOW_CHECK_LATENCY_MS

Examples:
  spam_check batman@mail.ru bruce.wayne@mail.ru
  spam_check --stats --batch-size 2 < keys.txt"#
)]
struct Args {
  /// JSON config file. Fields left out take their defaults.
  #[arg(long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Users per message lookup.
  #[arg(long, value_name = "N")]
  batch_size: Option<usize>,

  /// Concurrent spam checks issued by the pipeline.
  #[arg(long, value_name = "N")]
  max_in_flight: Option<usize>,

  /// Print backend call counters as JSON after the records.
  #[arg(long)]
  stats: bool,

  /// User keys (emails). Read from stdin when omitted.
  #[arg(value_name = "KEYS")]
  keys: Vec<String>,
}

fn load_config(args: &Args) -> Result<SpamCheckConfig, spamflow::ConfigError> {
  let mut config = match &args.config {
    Some(path) => SpamCheckConfig::from_json_file(path)?,
    None => SpamCheckConfig::default(),
  };
  if let Some(n) = args.batch_size {
    config.batch_size = n;
  }
  if let Some(n) = args.max_in_flight {
    config.max_in_flight = n;
  }
  config.apply_env()?;
  config.validate()?;
  Ok(config)
}

async fn read_stdin_keys() -> std::io::Result<Vec<String>> {
  let mut lines = BufReader::new(tokio::io::stdin()).lines();
  let mut keys = Vec::new();
  while let Some(line) = lines.next_line().await? {
    let key = line.trim();
    if !key.is_empty() {
      keys.push(key.to_string());
    }
  }
  Ok(keys)
}

#[tokio::main]
async fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let args = Args::parse();
  let config = match load_config(&args) {
    Ok(c) => c,
    Err(e) => {
      eprintln!("Error: {}", e);
      process::exit(2);
    }
  };
  info!(?config, "configuration");

  let keys = if args.keys.is_empty() {
    match read_stdin_keys().await {
      Ok(k) => k,
      Err(e) => {
        eprintln!("Error reading stdin: {}", e);
        process::exit(1);
      }
    }
  } else {
    args.keys.clone()
  };
  info!(keys = keys.len(), "pipeline starting");

  let backend = Arc::new(SimulatedBackend::from_config(&config));
  let started = tokio::time::Instant::now();
  let records = spam_pipeline(
    Pipeline::from_iter(keys),
    Arc::clone(&backend),
    &config,
  )
  .collect()
  .await;
  info!(records = records.len(), elapsed = ?started.elapsed(), "pipeline completed");

  for record in &records {
    println!("{}", record);
  }
  if args.stats {
    match serde_json::to_string_pretty(&backend.stats().snapshot()) {
      Ok(json) => println!("{}", json),
      Err(e) => {
        eprintln!("Error encoding stats: {}", e);
        process::exit(1);
      }
    }
  }
}
