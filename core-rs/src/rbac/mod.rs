//! RBAC (Role-Based Access Control) module
//!
//! Permission codes, the permission store with its fallback policy, and the
//! sources the store fetches from.

pub mod codes;
pub mod fallback;
pub mod source;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use codes::{PermissionCode, ALL_PERMISSIONS, READ_ONLY_PERMISSIONS};
pub use fallback::FallbackPolicy;
pub use source::PermissionSource;
pub use store::{PermissionOrigin, PermissionState, PermissionStore};
