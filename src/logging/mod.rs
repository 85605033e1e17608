//! Logging - Archive-backed Loggers
//!
//! ```text
//! Logger("RESTService") ──┐
//! Logger("Navigation")  ──┼──► LogArchive (newest-first ring, version)
//! Logger("Provider")    ──┘            │
//!                                      ├──► subscribers (version, reason)
//!                                      └──► tracing (console mirror)
//! ```

mod archive;
mod entry;
mod logger;

pub use archive::*;
pub use entry::*;
pub use logger::*;
