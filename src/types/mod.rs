//! Values flowing through the spam-checking pipeline.
//!
//! Each link carries exactly one of these types; nothing here outlives a run.

mod message_id;
mod message_result;
#[cfg(test)]
mod message_result_test;
mod user;

pub use message_id::MessageId;
pub use message_result::MessageResult;
pub use user::User;
