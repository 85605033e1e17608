//! Service Layer
//!
//! Long-lived runtime services and the provider that orchestrates them.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                     ServiceProvider                       │
//! │   registry (insertion order) ── start/stop fan-out        │
//! │  ┌───────────────────┐   ┌─────────────────────────────┐  │
//! │  │ NavigationService │   │ RestService                 │  │
//! │  │ (requests/history)│   │ (transport + normalizer)    │  │
//! │  └───────────────────┘   └─────────────────────────────┘  │
//! └───────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼ (version, reason, key)
//!                   change subscribers
//! ```

mod navigation;
mod provider;
pub mod rest;
mod service;

pub use navigation::*;
pub use provider::*;
pub use rest::RestService;
pub use service::*;
