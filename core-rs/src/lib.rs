//! # SCC Core - Security Kernel console runtime
//!
//! The security core of the SCC admin console: which screens exist, who the
//! current user is, what they may do, and which screen they are allowed to
//! reach. Pages are opaque to this crate; they are built by caller-supplied
//! factories once the guard chain admits them.
//!
//! ## Core Principle
//!
//! **Route keys are the only currency**: every link, breadcrumb and redirect
//! is resolved through the [`RouteRegistry`], so a path renamed in one place
//! is renamed everywhere and an unknown key fails loudly.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │   ConsoleConfig (demo | enterprise)  │
//! └──────────────────────────────────────┘
//!           │
//!     ┌─────┴────────────┐     ┌─────────────────┐
//!     │ IdentityProvider │────►│ PermissionStore │◄── GET /me/permissions
//!     └──────────────────┘     └─────────────────┘
//!           │                          │
//!           └──────► guards ◄──────────┘
//!                      │
//!                  Router ──► page factories
//! ```

pub mod api;
pub mod config;
pub mod console;
pub mod errors;
pub mod events;
pub mod guards;
pub mod identity;
pub mod query;
pub mod rbac;
pub mod router;
pub mod routes;
pub mod state;

pub use api::ApiClient;
pub use config::{AuthMode, ConsoleConfig};
pub use console::ConsoleContext;
pub use errors::{Result, SccError};
pub use events::{AuthEvents, AuthSignal};
pub use guards::{DenyReason, GuardPaths, GuardState, Redirect};
pub use identity::{AuthHeader, IdentityProvider, Persona, Principal, SimulatedIdentity};
pub use query::QueryCache;
pub use rbac::{FallbackPolicy, PermissionCode, PermissionOrigin, PermissionSource, PermissionState, PermissionStore};
pub use router::{Access, MountedRoute, Navigation, Navigator, RouteMatch, Router, RouterBuilder};
pub use routes::{NavSection, RouteMapEntry, RouteRegistry};
pub use state::{KeyValueStore, LocalState};

/// Version of the console security core
pub const VERSION: &str = "0.4.2";

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "scc.yaml";
