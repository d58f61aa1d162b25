//! Router Composition
//!
//! Wires the route registry, the guard chain and lazily built pages into a
//! navigable tree. Every bound route has exactly one registry entry, every
//! registry entry is bound, and no page is built before its guards allow it.

pub mod composition;
pub mod mounted;
pub mod navigator;
pub mod pattern;

pub use composition::{Access, Navigation, PageFactory, RouteMatch, Router, RouterBuilder};
pub use mounted::MountedRoute;
pub use navigator::{Location, NavigationKind, Navigator};
pub use pattern::RoutePattern;
