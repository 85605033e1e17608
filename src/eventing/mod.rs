//! Eventing - Change Notification Plumbing
//!
//! Shared subscriber bookkeeping for the log archive, services and the
//! navigation channel.

mod channel;
mod subscribers;

pub use channel::*;
pub use subscribers::*;
