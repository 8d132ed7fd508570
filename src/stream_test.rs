//! Tests for `stream`.

use futures::StreamExt;

use crate::stream::{CompletionGuard, link};

#[tokio::test]
async fn items_arrive_in_send_order() {
  let (out, mut inp) = link();
  out.send(1u32);
  out.send(2);
  out.send(3);
  out.close();
  assert_eq!(inp.recv().await, Some(1));
  assert_eq!(inp.recv().await, Some(2));
  assert_eq!(inp.recv().await, Some(3));
  assert_eq!(inp.recv().await, None);
}

#[tokio::test]
async fn clones_do_not_hold_the_link_open() {
  let (out, inp) = link::<&str>();
  let worker = out.clone();
  worker.send("a");
  out.close();
  assert!(worker.is_closed());
  // `worker` is still alive here; completion must not wait for it.
  assert_eq!(inp.collect_all().await, vec!["a"]);
  drop(worker);
}

#[tokio::test]
async fn inlet_is_a_stream() {
  let (out, inp) = link();
  for i in 0..4u8 {
    out.send(i);
  }
  out.close();
  let doubled: Vec<u8> = inp.map(|x| x * 2).collect().await;
  assert_eq!(doubled, vec![0, 2, 4, 6]);
}

#[tokio::test]
async fn guard_completes_on_drop() {
  let (out, inp) = link::<u8>();
  {
    let _guard = CompletionGuard::new(out.clone());
    out.send(9);
  }
  assert!(out.is_closed());
  assert_eq!(inp.collect_all().await, vec![9]);
}

#[tokio::test]
async fn guard_completes_when_stage_panics() {
  let (out, inp) = link::<u8>();
  let task_out = out.clone();
  let res = tokio::spawn(async move {
    let _guard = CompletionGuard::new(task_out.clone());
    task_out.send(1);
    if !task_out.is_closed() {
      panic!("boom");
    }
  })
  .await;
  assert!(res.is_err());
  assert_eq!(inp.collect_all().await, vec![1]);
}

#[test]
#[should_panic(expected = "stage wrote to its output after returning")]
fn send_after_completion_panics() {
  let (out, _inp) = link::<u8>();
  out.close();
  out.send(1);
}

#[test]
#[should_panic(expected = "link completed twice")]
fn double_completion_panics() {
  let (out, _inp) = link::<u8>();
  out.close();
  out.close();
}

#[tokio::test]
async fn send_to_dropped_consumer_is_ignored() {
  let (out, inp) = link::<u8>();
  drop(inp);
  out.send(1);
  out.close();
}
