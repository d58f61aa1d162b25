//! Simulated (demo) identity
//!
//! Holds a fixed persona roster. The active persona id is echoed to the local
//! state key [`PERSONA_KEY`] so it survives restarts; an unset or unknown id
//! falls back to the first roster entry.

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::{info, warn};

use crate::errors::{Result, SccError};
use crate::identity::principal::{Persona, Principal};
use crate::state::{KeyValueStore, PERSONA_KEY};

pub const DEFAULT_TENANT_ID: &str = "tenant-demo";

/// Demo roster; the first entry is the default persona
///
/// The super-admin persona carries `super_admin_email` so the fallback policy
/// always recognises it.
pub fn default_roster(super_admin_email: &str) -> Vec<Persona> {
    vec![
        Persona::new("super-admin", "u-1001", "Platform Administrator", super_admin_email, "Super Admin"),
        Persona::new("role-manager", "u-1002", "Role Manager", "roles@scc.local", "Role Manager"),
        Persona::new("auditor", "u-1003", "Compliance Auditor", "auditor@scc.local", "Auditor"),
        Persona::new("viewer", "u-1004", "Read-only Viewer", "viewer@scc.local", "Viewer"),
    ]
}

pub struct SimulatedIdentity {
    roster: Vec<Persona>,
    tenant_id: String,
    store: Arc<dyn KeyValueStore>,
    active: Mutex<usize>,
    principal: watch::Sender<Principal>,
}

impl SimulatedIdentity {
    /// Build from a roster; `tenant_override` replaces the default tenant
    pub fn new(
        roster: Vec<Persona>,
        tenant_override: Option<String>,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        if roster.is_empty() {
            return Err(SccError::Config("simulated identity roster is empty".to_string()));
        }

        let tenant_id = tenant_override.unwrap_or_else(|| DEFAULT_TENANT_ID.to_string());

        let active = match store.get(PERSONA_KEY) {
            Some(stored) => match roster.iter().position(|p| p.id == stored) {
                Some(idx) => idx,
                None => {
                    warn!(persona = %stored, "Stored persona not in roster, using default");
                    0
                }
            },
            None => 0,
        };

        let (principal, _) = watch::channel(roster[active].to_principal(&tenant_id));

        Ok(SimulatedIdentity {
            roster,
            tenant_id,
            store,
            active: Mutex::new(active),
            principal,
        })
    }

    pub fn with_default_roster(
        tenant_override: Option<String>,
        super_admin_email: &str,
        store: Arc<dyn KeyValueStore>,
    ) -> Result<Self> {
        Self::new(default_roster(super_admin_email), tenant_override, store)
    }

    pub fn roster(&self) -> &[Persona] {
        &self.roster
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn active_persona(&self) -> &Persona {
        let idx = self.active.lock().map(|guard| *guard).unwrap_or(0);
        &self.roster[idx]
    }

    pub fn principal(&self) -> Principal {
        self.principal.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Principal> {
        self.principal.subscribe()
    }

    /// Make `persona_id` the active persona
    ///
    /// Synchronous: the new principal is published before this returns.
    /// Returns `false` when the persona was already active.
    pub fn switch_persona(&self, persona_id: &str) -> Result<bool> {
        let idx = self
            .roster
            .iter()
            .position(|p| p.id == persona_id)
            .ok_or_else(|| SccError::UnknownPersona(persona_id.to_string()))?;

        let mut active = self
            .active
            .lock()
            .map_err(|_| SccError::Store("persona lock poisoned".to_string()))?;

        self.store.set(PERSONA_KEY, persona_id)?;

        if *active == idx {
            return Ok(false);
        }

        *active = idx;
        let persona = &self.roster[idx];
        info!(persona = %persona.id, email = %persona.email, "Switched demo persona");
        self.principal.send_replace(persona.to_principal(&self.tenant_id));
        Ok(true)
    }
}

impl std::fmt::Debug for SimulatedIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedIdentity")
            .field("tenant_id", &self.tenant_id)
            .field("active", &self.active_persona().id)
            .finish()
    }
}
