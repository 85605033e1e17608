//! Helper Utilities
//!
//! Common utilities used across the runtime.

mod bounded;
mod fs;

pub use bounded::*;
pub use fs::*;
