//! Route registry and the console route table
//!
//! Insertion order is significant: it drives rendered navigation order and is
//! never re-sorted.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SccError};
use crate::rbac::codes;
use crate::routes::keys;

/// Navigation group a route is listed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NavSection {
    Overview,
    AccessControl,
    Audit,
    Platform,
    System,
}

impl NavSection {
    pub fn label(&self) -> &'static str {
        match self {
            NavSection::Overview => "Overview",
            NavSection::AccessControl => "Access control",
            NavSection::Audit => "Audit",
            NavSection::Platform => "Platform",
            NavSection::System => "System",
        }
    }
}

impl fmt::Display for NavSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Static descriptor for one navigable path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMapEntry {
    pub path: String,
    pub route_key: String,
    pub label: String,
    pub nav_section: NavSection,
    /// `None`: no permission check, allowed once authenticated
    pub required_permission: Option<String>,
    pub show_in_nav: bool,
    pub breadcrumb: Vec<String>,
}

impl RouteMapEntry {
    pub fn new(
        route_key: &str,
        path: &str,
        label: &str,
        nav_section: NavSection,
        required_permission: Option<&str>,
        show_in_nav: bool,
        breadcrumb: &[&str],
    ) -> Self {
        RouteMapEntry {
            path: path.to_string(),
            route_key: route_key.to_string(),
            label: label.to_string(),
            nav_section,
            required_permission: required_permission.map(str::to_string),
            show_in_nav,
            breadcrumb: breadcrumb.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RouteRegistry {
    entries: Vec<RouteMapEntry>,
}

impl RouteRegistry {
    /// Build a registry, rejecting duplicate keys or paths
    pub fn new(entries: Vec<RouteMapEntry>) -> Result<Self> {
        let mut seen_keys = HashSet::new();
        let mut seen_paths = HashSet::new();

        for entry in &entries {
            if !seen_keys.insert(entry.route_key.as_str()) {
                return Err(SccError::DuplicateRouteKey(entry.route_key.clone()));
            }
            if !seen_paths.insert(entry.path.as_str()) {
                return Err(SccError::DuplicatePath(entry.path.clone()));
            }
            if let Some(code) = &entry.required_permission {
                if !codes::PermissionCode::is_well_formed(code) {
                    return Err(SccError::InvalidPermissionCode(format!(
                        "{} (route '{}')",
                        code, entry.route_key
                    )));
                }
            }
        }

        Ok(RouteRegistry { entries })
    }

    /// The console's route table
    pub fn console() -> Result<Self> {
        use NavSection::*;

        Self::new(vec![
            RouteMapEntry::new(keys::DASHBOARD, "/", "Dashboard", Overview, None, true, &["Dashboard"]),
            RouteMapEntry::new(
                keys::ROLES,
                "/roles",
                "Roles",
                AccessControl,
                Some(codes::ROLE_READ),
                true,
                &["Access control", "Roles"],
            ),
            RouteMapEntry::new(
                keys::ROLE_CREATE,
                "/roles/new",
                "Create role",
                AccessControl,
                Some(codes::ROLE_CREATE),
                false,
                &["Access control", "Roles", "Create role"],
            ),
            RouteMapEntry::new(
                keys::ROLE_DETAIL,
                "/roles/:roleId",
                "Role details",
                AccessControl,
                Some(codes::ROLE_READ),
                false,
                &["Access control", "Roles", "Role details"],
            ),
            RouteMapEntry::new(
                keys::USER_ROLES,
                "/user-roles",
                "User role assignments",
                AccessControl,
                Some(codes::USER_ROLE_READ),
                true,
                &["Access control", "User role assignments"],
            ),
            RouteMapEntry::new(
                keys::USER_ROLE_ASSIGN,
                "/user-roles/assign",
                "Assign roles",
                AccessControl,
                Some(codes::USER_ROLE_ASSIGN),
                false,
                &["Access control", "User role assignments", "Assign roles"],
            ),
            RouteMapEntry::new(
                keys::AUDIT_LOGS,
                "/audit-logs",
                "Audit log",
                Audit,
                Some(codes::AUDIT_READ),
                true,
                &["Audit", "Audit log"],
            ),
            RouteMapEntry::new(
                keys::MODULES,
                "/modules",
                "Modules",
                Platform,
                Some(codes::MODULE_READ),
                true,
                &["Platform", "Modules"],
            ),
            RouteMapEntry::new(
                keys::MODULE_SETTINGS,
                "/modules/:moduleId/settings",
                "Module settings",
                Platform,
                Some(codes::MODULE_MANAGE),
                false,
                &["Platform", "Modules", "Module settings"],
            ),
            RouteMapEntry::new(
                keys::SETTINGS,
                "/settings",
                "Global settings",
                System,
                Some(codes::ADMIN_GLOBAL),
                true,
                &["System", "Global settings"],
            ),
            RouteMapEntry::new(keys::PROFILE, "/profile", "My profile", System, None, false, &["My profile"]),
            RouteMapEntry::new(keys::LOGIN, "/login", "Sign in", System, None, false, &["Sign in"]),
            RouteMapEntry::new(keys::FORBIDDEN, "/forbidden", "Access denied", System, None, false, &["Access denied"]),
            RouteMapEntry::new(keys::NOT_FOUND, "/not-found", "Page not found", System, None, false, &["Page not found"]),
        ])
    }

    /// Entry for `route_key`; `UnknownRouteKey` signals registry drift
    pub fn get_entry(&self, route_key: &str) -> Result<&RouteMapEntry> {
        self.entries
            .iter()
            .find(|e| e.route_key == route_key)
            .ok_or_else(|| SccError::UnknownRouteKey(route_key.to_string()))
    }

    pub fn get_path(&self, route_key: &str) -> Result<&str> {
        self.get_entry(route_key).map(|e| e.path.as_str())
    }

    /// Concrete path with `:param` segments substituted
    pub fn href(&self, route_key: &str, params: &[(&str, &str)]) -> Result<String> {
        let pattern = self.get_path(route_key)?;
        let mut segments = Vec::new();

        for segment in pattern.split('/') {
            match segment.strip_prefix(':') {
                Some(name) => {
                    let value = params
                        .iter()
                        .find(|(k, _)| *k == name)
                        .map(|(_, v)| *v)
                        .ok_or_else(|| {
                            SccError::Config(format!("missing parameter '{}' for route '{}'", name, route_key))
                        })?;
                    segments.push(value);
                }
                None => segments.push(segment),
            }
        }

        Ok(segments.join("/"))
    }

    /// Entries shown in navigation, in registry order
    pub fn list_nav_entries(&self) -> Vec<&RouteMapEntry> {
        self.entries.iter().filter(|e| e.show_in_nav).collect()
    }

    /// Navigation entries grouped by section, sections in order of first appearance
    pub fn nav_sections(&self) -> Vec<(NavSection, Vec<&RouteMapEntry>)> {
        let mut groups: Vec<(NavSection, Vec<&RouteMapEntry>)> = Vec::new();
        for entry in self.list_nav_entries() {
            match groups.iter_mut().find(|(section, _)| *section == entry.nav_section) {
                Some((_, items)) => items.push(entry),
                None => groups.push((entry.nav_section, vec![entry])),
            }
        }
        groups
    }

    pub fn breadcrumb(&self, route_key: &str) -> Result<&[String]> {
        self.get_entry(route_key).map(|e| e.breadcrumb.as_slice())
    }

    pub fn entries(&self) -> &[RouteMapEntry] {
        &self.entries
    }

    pub fn contains(&self, route_key: &str) -> bool {
        self.entries.iter().any(|e| e.route_key == route_key)
    }
}
