//! Console configuration
//!
//! Build/deploy-time flags: which identity variant is active, the remote API
//! base, an optional tenant override for simulated identity and the
//! permission fetch timeout. Read once at start-up.

pub mod console_config;

pub use console_config::{AuthMode, ConsoleConfig};
