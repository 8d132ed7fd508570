//! Tests for `MessageResult`.

use std::cmp::Ordering;

use super::{MessageId, MessageResult};

#[test]
fn display_is_flag_then_id() {
  assert_eq!(MessageResult::new(42, true).to_string(), "true 42");
  assert_eq!(
    MessageResult::new(MessageId(u64::MAX), false).to_string(),
    format!("false {}", u64::MAX)
  );
}

#[test]
fn spam_sorts_before_clean() {
  let spam = MessageResult::new(100, true);
  let clean = MessageResult::new(1, false);
  assert_eq!(spam.report_order(&clean), Ordering::Less);
  assert_eq!(clean.report_order(&spam), Ordering::Greater);
}

#[test]
fn equal_flags_sort_by_id() {
  let a = MessageResult::new(1, false);
  let b = MessageResult::new(2, false);
  assert_eq!(a.report_order(&b), Ordering::Less);
  assert_eq!(b.report_order(&a), Ordering::Greater);
  assert_eq!(a.report_order(&a), Ordering::Equal);
}
