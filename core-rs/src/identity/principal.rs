//! Principal and persona value types

use serde::{Deserialize, Serialize};

/// The current user session as seen by the console
///
/// When `is_authenticated` is false every identity field is `None`; the
/// constructors are the only way to build one, so that holds structurally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    is_authenticated: bool,
    is_loading: bool,
    user_id: Option<String>,
    tenant_id: Option<String>,
    display_name: Option<String>,
    email: Option<String>,
}

impl Principal {
    /// Signed out, nothing pending
    pub fn anonymous() -> Self {
        Principal {
            is_authenticated: false,
            is_loading: false,
            user_id: None,
            tenant_id: None,
            display_name: None,
            email: None,
        }
    }

    /// Identity not yet known (provider still initialising)
    pub fn loading() -> Self {
        Principal {
            is_loading: true,
            ..Principal::anonymous()
        }
    }

    pub fn authenticated(
        user_id: impl Into<String>,
        tenant_id: impl Into<String>,
        display_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Principal {
            is_authenticated: true,
            is_loading: false,
            user_id: Some(user_id.into()),
            tenant_id: Some(tenant_id.into()),
            display_name: Some(display_name.into()),
            email: Some(email.into()),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id.as_deref()
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// The fields whose change invalidates the permission set
    pub fn identity_key(&self) -> (bool, Option<&str>, Option<&str>) {
        (self.is_authenticated, self.user_id(), self.tenant_id())
    }
}

/// One entry of the simulated identity roster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub id: String,
    pub user_id: String,
    pub display_name: String,
    pub email: String,
    pub role_label: String,
}

impl Persona {
    pub fn new(id: &str, user_id: &str, display_name: &str, email: &str, role_label: &str) -> Self {
        Persona {
            id: id.to_string(),
            user_id: user_id.to_string(),
            display_name: display_name.to_string(),
            email: email.to_string(),
            role_label: role_label.to_string(),
        }
    }

    pub fn to_principal(&self, tenant_id: &str) -> Principal {
        Principal::authenticated(&self.user_id, tenant_id, &self.display_name, &self.email)
    }
}
