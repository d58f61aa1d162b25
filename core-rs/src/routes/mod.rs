//! Route Registry
//!
//! Static, ordered table mapping a route key to its path, required permission,
//! navigation metadata and breadcrumb trail. Links resolve target paths only
//! through the registry, never through literal strings.

pub mod keys;
pub mod registry;

pub use registry::{NavSection, RouteMapEntry, RouteRegistry};
