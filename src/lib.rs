//! Service Runtime Library
//!
//! Client-side application runtime: service lifecycle with versioned change
//! notification, a bounded log archive, navigation requests and REST access
//! normalized into a uniform response envelope.

pub mod communication;
pub mod config;
pub mod constants;
pub mod context;
pub mod domain;
pub mod error;
pub mod eventing;
pub mod helpers;
pub mod i18n;
pub mod logging;
pub mod services;
