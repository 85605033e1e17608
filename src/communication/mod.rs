//! Communication - Response Envelope
//!
//! The shape every asynchronous operation reports its outcome in.

mod response;

pub use response::*;
