//! Router composition
//!
//! Binds registry entries to lazily built pages. A page factory is only
//! invoked once the guard chain for its route resolved to `Allowed`.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::{Result, SccError};
use crate::guards::{self, DenyReason, GuardPaths, GuardState};
use crate::identity::Principal;
use crate::rbac::PermissionState;
use crate::router::pattern::RoutePattern;
use crate::routes::{RouteMapEntry, RouteRegistry};

/// Whether a route passes through the guard chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Shell routes reachable while signed out (login, forbidden)
    Public,
    /// Authentication guard, then permission guard
    Protected,
}

pub type PageFactory<P> = Arc<dyn Fn(&RouteMatch) -> P + Send + Sync>;

/// A resolved path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub route_key: String,
    pub path: String,
    pub params: BTreeMap<String, String>,
}

impl RouteMatch {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Outcome of a navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation<P> {
    Render { route: RouteMatch, page: P },
    Loading { route: RouteMatch },
    Redirect { from: String, to: String, reason: DenyReason },
    NotFound { path: String },
}

impl<P> Navigation<P> {
    pub fn page(&self) -> Option<&P> {
        match self {
            Navigation::Render { page, .. } => Some(page),
            _ => None,
        }
    }

    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Navigation::Redirect { to, .. } => Some(to),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Navigation::Loading { .. })
    }
}

struct RouteBinding<P> {
    entry: RouteMapEntry,
    pattern: RoutePattern,
    access: Access,
    page: PageFactory<P>,
}

pub struct RouterBuilder<P> {
    registry: Arc<RouteRegistry>,
    bindings: Vec<(String, Access, PageFactory<P>)>,
}

impl<P> RouterBuilder<P> {
    pub fn new(registry: Arc<RouteRegistry>) -> Self {
        RouterBuilder {
            registry,
            bindings: Vec::new(),
        }
    }

    pub fn protected<F>(mut self, route_key: &str, page: F) -> Self
    where
        F: Fn(&RouteMatch) -> P + Send + Sync + 'static,
    {
        let page: PageFactory<P> = Arc::new(page);
        self.bindings.push((route_key.to_string(), Access::Protected, page));
        self
    }

    pub fn public<F>(mut self, route_key: &str, page: F) -> Self
    where
        F: Fn(&RouteMatch) -> P + Send + Sync + 'static,
    {
        let page: PageFactory<P> = Arc::new(page);
        self.bindings.push((route_key.to_string(), Access::Public, page));
        self
    }

    /// Validate the composition against the registry
    ///
    /// Fails when a binding names an unknown key, a key is bound twice, or a
    /// registry entry has no binding (navigation would link to a dead path).
    pub fn build(self) -> Result<Router<P>> {
        let paths = GuardPaths::from_registry(&self.registry)?;
        let mut seen = HashSet::new();
        let mut bindings = Vec::with_capacity(self.bindings.len());

        for (route_key, access, page) in self.bindings {
            let entry = self.registry.get_entry(&route_key)?.clone();
            if !seen.insert(route_key.clone()) {
                return Err(SccError::DuplicateBinding(route_key));
            }
            bindings.push(RouteBinding {
                pattern: RoutePattern::parse(&entry.path),
                entry,
                access,
                page,
            });
        }

        for entry in self.registry.entries() {
            if !seen.contains(&entry.route_key) {
                return Err(SccError::UnroutedPath(format!("{} ({})", entry.path, entry.route_key)));
            }
        }

        info!(routes = bindings.len(), "Router composed");

        Ok(Router {
            registry: self.registry,
            paths,
            bindings,
        })
    }
}

pub struct Router<P> {
    registry: Arc<RouteRegistry>,
    paths: GuardPaths,
    bindings: Vec<RouteBinding<P>>,
}

impl<P> Router<P> {
    pub fn builder(registry: Arc<RouteRegistry>) -> RouterBuilder<P> {
        RouterBuilder::new(registry)
    }

    pub fn registry(&self) -> &Arc<RouteRegistry> {
        &self.registry
    }

    pub fn guard_paths(&self) -> &GuardPaths {
        &self.paths
    }

    /// Most specific binding matching `path`
    pub fn match_path(&self, path: &str) -> Option<(RouteMatch, &RouteMapEntry, Access)> {
        self.bindings
            .iter()
            .filter_map(|b| b.pattern.matches(path).map(|params| (b, params)))
            .max_by_key(|(b, _)| b.pattern.specificity())
            .map(|(b, params)| {
                (
                    RouteMatch {
                        route_key: b.entry.route_key.clone(),
                        path: path.to_string(),
                        params,
                    },
                    &b.entry,
                    b.access,
                )
            })
    }

    /// Guard state for `path` without rendering anything
    pub fn guard_state(&self, path: &str, principal: &Principal, permissions: &PermissionState) -> Option<GuardState> {
        self.match_path(path).map(|(_, entry, access)| match access {
            Access::Public => GuardState::Allowed,
            Access::Protected => guards::evaluate(principal, permissions, entry, &self.paths),
        })
    }

    /// Resolve `path` through the guard chain
    pub fn resolve(&self, path: &str, principal: &Principal, permissions: &PermissionState) -> Navigation<P> {
        let Some(binding) = self
            .bindings
            .iter()
            .filter_map(|b| b.pattern.matches(path).map(|params| (b, params)))
            .max_by_key(|(b, _)| b.pattern.specificity())
        else {
            debug!(path, "No route matches");
            return Navigation::NotFound { path: path.to_string() };
        };

        let (binding, params) = binding;
        let route = RouteMatch {
            route_key: binding.entry.route_key.clone(),
            path: path.to_string(),
            params,
        };

        let state = match binding.access {
            Access::Public => GuardState::Allowed,
            Access::Protected => guards::evaluate(principal, permissions, &binding.entry, &self.paths),
        };

        match state {
            GuardState::Allowed => {
                let page = (binding.page)(&route);
                Navigation::Render { route, page }
            }
            GuardState::Pending => Navigation::Loading { route },
            GuardState::Denied(redirect) => {
                info!(from = path, to = %redirect.to, reason = ?redirect.reason, "Route denied");
                Navigation::Redirect {
                    from: path.to_string(),
                    to: redirect.to,
                    reason: redirect.reason,
                }
            }
        }
    }
}
