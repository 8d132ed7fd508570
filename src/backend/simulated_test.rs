//! Tests for `SimulatedBackend`.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::{Backend, BackendError, SimulatedBackend, resolve_alias, user_id};
use crate::config::SpamCheckConfig;
use crate::types::{MessageId, User};

fn instant_backend() -> SimulatedBackend {
  SimulatedBackend::from_config(&SpamCheckConfig::default().without_latency())
}

#[test]
fn aliases_map_to_canonical_email() {
  assert_eq!(resolve_alias("batman@mail.ru"), "bruce.wayne@mail.ru");
  assert_eq!(resolve_alias("spiderman@mail.ru"), "peter.parker@mail.ru");
  assert_eq!(resolve_alias("noname@mail.ru"), "noname@mail.ru");
}

#[test]
fn user_id_is_crc64_iso() {
  assert_eq!(user_id("bruce.wayne@mail.ru"), 12499983457589032104);
}

#[tokio::test]
async fn aliased_keys_resolve_to_same_user() {
  let backend = instant_backend();
  let a = backend.resolve_user("batman@mail.ru").await;
  let b = backend.resolve_user("bruce.wayne@mail.ru").await;
  assert_eq!(a, b);
  assert_eq!(a, User::new(12499983457589032104, "bruce.wayne@mail.ru"));
  assert_eq!(backend.stats().snapshot().resolve_calls, 2);
}

#[tokio::test(start_paused = true)]
async fn resolve_takes_configured_latency() {
  let backend = SimulatedBackend::default();
  let start = Instant::now();
  backend.resolve_user("k.kitsuragi@mail.ru").await;
  let elapsed = start.elapsed();
  assert!(elapsed >= Duration::from_secs(1));
  assert!(elapsed < Duration::from_millis(1010));
}

#[tokio::test]
async fn lookup_is_deterministic_per_user() {
  let backend = instant_backend();
  let user = backend.resolve_user("d.vader@mail.ru").await;
  let first = backend.lookup_messages(std::slice::from_ref(&user)).await.unwrap();
  let second = backend.lookup_messages(&[user]).await.unwrap();
  assert_eq!(first, second);
  assert!((1..=10).contains(&first.len()));
}

#[tokio::test]
async fn lookup_concatenates_per_user_messages() {
  let backend = instant_backend();
  let a = backend.resolve_user("e.musk@mail.ru").await;
  let b = backend.resolve_user("noname@mail.ru").await;
  let only_a = backend.lookup_messages(std::slice::from_ref(&a)).await.unwrap();
  let only_b = backend.lookup_messages(std::slice::from_ref(&b)).await.unwrap();
  let both = backend.lookup_messages(&[a, b]).await.unwrap();
  assert_eq!(both, [only_a, only_b].concat());
}

#[tokio::test]
async fn lookup_over_limit_fails_closed() {
  let backend = instant_backend();
  let users: Vec<User> = (0..3).map(|i| User::new(i, format!("{i}@mail.ru"))).collect();
  let err = backend.lookup_messages(&users).await.unwrap_err();
  assert_eq!(err, BackendError::BatchTooLarge { len: 3, max: 2 });
  let snap = backend.stats().snapshot();
  assert_eq!(snap.lookup_calls, 1);
  assert_eq!(snap.lookup_users, 3);
  assert_eq!(snap.lookup_errors, 1);
}

#[tokio::test]
async fn check_is_deterministic_per_message() {
  let backend = instant_backend();
  let id = MessageId(221945221381252775);
  let first = backend.check_spam(id).await.unwrap();
  assert_eq!(backend.check_spam(id).await.unwrap(), first);
}

#[tokio::test(start_paused = true)]
async fn checks_past_the_limit_are_rejected_with_positive_flag() {
  let backend = Arc::new(SimulatedBackend::default());
  let mut handles = Vec::new();
  for i in 0..7u64 {
    let backend = Arc::clone(&backend);
    handles.push(tokio::spawn(async move { backend.check_spam(MessageId(i)).await }));
  }
  let mut rejected = 0;
  for h in handles {
    match h.await.unwrap() {
      Ok(_) => {}
      Err(BackendError::TooManyRequests { reported_spam }) => {
        assert!(reported_spam);
        rejected += 1;
      }
      Err(other) => panic!("unexpected error: {other}"),
    }
  }
  assert_eq!(rejected, 2);
  let snap = backend.stats().snapshot();
  assert_eq!(snap.check_calls, 7);
  assert_eq!(snap.check_errors, 2);
}

#[tokio::test(start_paused = true)]
async fn admission_slot_is_released_after_each_call() {
  let backend = SimulatedBackend::default();
  for i in 0..20u64 {
    assert!(backend.check_spam(MessageId(i)).await.is_ok());
  }
}
