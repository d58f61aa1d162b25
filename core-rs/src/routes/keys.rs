//! Route keys of the console table

pub const DASHBOARD: &str = "dashboard";
pub const ROLES: &str = "roles";
pub const ROLE_CREATE: &str = "roles.create";
pub const ROLE_DETAIL: &str = "roles.detail";
pub const USER_ROLES: &str = "user-roles";
pub const USER_ROLE_ASSIGN: &str = "user-roles.assign";
pub const AUDIT_LOGS: &str = "audit-logs";
pub const MODULES: &str = "modules";
pub const MODULE_SETTINGS: &str = "modules.settings";
pub const SETTINGS: &str = "settings";
pub const PROFILE: &str = "profile";
pub const LOGIN: &str = "login";
pub const FORBIDDEN: &str = "forbidden";
pub const NOT_FOUND: &str = "not-found";
