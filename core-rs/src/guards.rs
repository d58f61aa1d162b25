//! Access Guards
//!
//! Two guards compose in a fixed order around every protected page:
//!
//! ```text
//! Principal ──► authentication guard ──► permission guard ──► page
//!                 loading → Pending        loading → Pending
//!                 anonymous → /login       missing code → /forbidden
//! ```
//!
//! Both are pure functions of their inputs so the state machine is recomputed
//! on every principal or permission change; nothing caches a denial.

use tracing::error;

use crate::errors::Result;
use crate::identity::Principal;
use crate::rbac::PermissionState;
use crate::routes::{keys, RouteMapEntry, RouteRegistry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    Unauthenticated,
    MissingPermission(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: String,
    pub reason: DenyReason,
}

/// Per-route guard state; children render only from `Allowed`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    Pending,
    Allowed,
    Denied(Redirect),
}

impl GuardState {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardState::Allowed)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, GuardState::Pending)
    }

    pub fn redirect(&self) -> Option<&Redirect> {
        match self {
            GuardState::Denied(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GuardState::Pending => "PENDING",
            GuardState::Allowed => "ALLOWED",
            GuardState::Denied(_) => "DENIED",
        }
    }
}

/// Redirect targets, resolved from the registry once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardPaths {
    pub login: String,
    pub forbidden: String,
}

impl GuardPaths {
    pub fn from_registry(registry: &RouteRegistry) -> Result<Self> {
        Ok(GuardPaths {
            login: registry.get_path(keys::LOGIN)?.to_string(),
            forbidden: registry.get_path(keys::FORBIDDEN)?.to_string(),
        })
    }
}

pub fn authentication_guard(principal: &Principal, paths: &GuardPaths) -> GuardState {
    if principal.is_loading() {
        return GuardState::Pending;
    }
    if !principal.is_authenticated() {
        return GuardState::Denied(Redirect {
            to: paths.login.clone(),
            reason: DenyReason::Unauthenticated,
        });
    }
    GuardState::Allowed
}

pub fn permission_guard(entry: &RouteMapEntry, permissions: &PermissionState, paths: &GuardPaths) -> GuardState {
    let Some(required) = entry.required_permission.as_deref() else {
        return GuardState::Allowed;
    };
    if permissions.is_loading {
        return GuardState::Pending;
    }
    if permissions.permissions.contains(required) {
        GuardState::Allowed
    } else {
        GuardState::Denied(Redirect {
            to: paths.forbidden.clone(),
            reason: DenyReason::MissingPermission(required.to_string()),
        })
    }
}

/// Composed guard chain for one route entry
pub fn evaluate(
    principal: &Principal,
    permissions: &PermissionState,
    entry: &RouteMapEntry,
    paths: &GuardPaths,
) -> GuardState {
    match authentication_guard(principal, paths) {
        GuardState::Allowed => permission_guard(entry, permissions, paths),
        other => other,
    }
}

/// Composed guard chain resolved by route key
///
/// An unknown key is registry drift: debug builds panic, release builds
/// return `UnknownRouteKey`.
pub fn evaluate_route(
    registry: &RouteRegistry,
    route_key: &str,
    principal: &Principal,
    permissions: &PermissionState,
    paths: &GuardPaths,
) -> Result<GuardState> {
    let entry = registry.get_entry(route_key).map_err(|e| {
        error!(route_key, "Guard references a route key missing from the registry");
        debug_assert!(false, "route key '{}' is not registered", route_key);
        e
    })?;
    Ok(evaluate(principal, permissions, entry, paths))
}

/// Conditional-UI check (nav items, action buttons); never a gate for mutations
pub fn has_permission(permissions: &PermissionState, code: Option<&str>) -> bool {
    permissions.has_permission(code)
}
