//! A user resolved from an input key.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A resolved user. Identity is `id`, not the key it was resolved from:
/// two keys may alias to the same user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
  pub id: u64,
  pub email: String,
}

impl User {
  pub fn new(id: u64, email: impl Into<String>) -> Self {
    Self {
      id,
      email: email.into(),
    }
  }
}

impl fmt::Display for User {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{{{} {}}}", self.id, self.email)
  }
}
