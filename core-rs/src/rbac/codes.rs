//! Permission codes
//!
//! A permission code has the form `RESOURCE:ACTION`, both halves upper-case
//! identifiers (`ROLE:READ`, `USER_ROLE:ASSIGN`).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{Result, SccError};

pub const ROLE_READ: &str = "ROLE:READ";
pub const ROLE_CREATE: &str = "ROLE:CREATE";
pub const ROLE_UPDATE: &str = "ROLE:UPDATE";
pub const ROLE_DELETE: &str = "ROLE:DELETE";
pub const USER_ROLE_READ: &str = "USER_ROLE:READ";
pub const USER_ROLE_ASSIGN: &str = "USER_ROLE:ASSIGN";
pub const AUDIT_READ: &str = "AUDIT:READ";
pub const AUDIT_EXPORT: &str = "AUDIT:EXPORT";
pub const MODULE_READ: &str = "MODULE:READ";
pub const MODULE_MANAGE: &str = "MODULE:MANAGE";
pub const ADMIN_GLOBAL: &str = "ADMIN:GLOBAL";

/// Every code the console knows about
pub const ALL_PERMISSIONS: &[&str] = &[
    ROLE_READ,
    ROLE_CREATE,
    ROLE_UPDATE,
    ROLE_DELETE,
    USER_ROLE_READ,
    USER_ROLE_ASSIGN,
    AUDIT_READ,
    AUDIT_EXPORT,
    MODULE_READ,
    MODULE_MANAGE,
    ADMIN_GLOBAL,
];

/// Read-only codes
pub const READ_ONLY_PERMISSIONS: &[&str] = &[ROLE_READ, USER_ROLE_READ, AUDIT_READ, MODULE_READ];

static CODE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z][A-Z0-9_]*:[A-Z][A-Z0-9_]*$").expect("permission code pattern is valid")
});

/// A validated `RESOURCE:ACTION` permission code
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PermissionCode(String);

impl PermissionCode {
    pub fn parse(code: &str) -> Result<Self> {
        if !Self::is_well_formed(code) {
            return Err(SccError::InvalidPermissionCode(code.to_string()));
        }
        Ok(PermissionCode(code.to_string()))
    }

    pub fn is_well_formed(code: &str) -> bool {
        CODE_PATTERN.is_match(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn resource(&self) -> &str {
        self.0.split_once(':').map(|(r, _)| r).unwrap_or(&self.0)
    }

    pub fn action(&self) -> &str {
        self.0.split_once(':').map(|(_, a)| a).unwrap_or("")
    }
}

impl fmt::Display for PermissionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PermissionCode {
    type Err = SccError;

    fn from_str(s: &str) -> Result<Self> {
        PermissionCode::parse(s)
    }
}

impl TryFrom<String> for PermissionCode {
    type Error = SccError;

    fn try_from(value: String) -> Result<Self> {
        PermissionCode::parse(&value)
    }
}

impl From<PermissionCode> for String {
    fn from(code: PermissionCode) -> Self {
        code.0
    }
}

impl AsRef<str> for PermissionCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
