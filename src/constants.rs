//! Runtime Constants
//!
//! Centralized defaults shared by configuration and components.

/// Bounded archive capacities
pub const LOG_ARCHIVE_CAPACITY: usize = 5000;
pub const NAVIGATION_HISTORY_CAPACITY: usize = 2000;

/// Prefix stamped on log lines when a logger is created without one
pub const DEFAULT_LOG_PREFIX: &str = "WEB";

/// Upper bound for a single service start/stop during registry fan-out
pub const LIFECYCLE_TIMEOUT_MS: u64 = 30_000;

/// REST request timeout
pub const REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Name of the configuration file inside the platform config directory
pub const CONFIG_FILE_NAME: &str = "runtime.toml";

/// Well-known service keys used when wiring the default service dictionary
pub mod service_keys {
    pub const NAVIGATION_SERVICE: &str = "NavigationService";
    pub const REST_SERVICE: &str = "RESTService";
    pub const SERVICE_PROVIDER: &str = "ServiceProvider";
}
