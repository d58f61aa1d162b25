//! Fallback permissions substituted when the fetch fails
//!
//! Demo usage must stay navigable without a backend, production usage must
//! never grant anything on error:
//! - simulated identity: the super-admin persona (matched by email) gets every
//!   known code, everybody else the read-only baseline
//! - external identity: empty set

use std::collections::BTreeSet;

use crate::config::AuthMode;
use crate::identity::Principal;
use crate::rbac::codes::{ALL_PERMISSIONS, READ_ONLY_PERMISSIONS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackPolicy {
    Tiered { super_admin_email: String },
    FailClosed,
}

impl FallbackPolicy {
    pub fn for_mode(mode: AuthMode, super_admin_email: &str) -> Self {
        match mode {
            AuthMode::Demo => FallbackPolicy::Tiered {
                super_admin_email: super_admin_email.to_string(),
            },
            AuthMode::Enterprise => FallbackPolicy::FailClosed,
        }
    }

    pub fn fallback_for(&self, principal: &Principal) -> BTreeSet<String> {
        match self {
            FallbackPolicy::FailClosed => BTreeSet::new(),
            FallbackPolicy::Tiered { super_admin_email } => {
                let codes = if principal.email() == Some(super_admin_email.as_str()) {
                    ALL_PERMISSIONS
                } else {
                    READ_ONLY_PERMISSIONS
                };
                codes.iter().map(|c| c.to_string()).collect()
            }
        }
    }

    pub fn is_fail_closed(&self) -> bool {
        matches!(self, FallbackPolicy::FailClosed)
    }
}
