//! Identity provider selection
//!
//! The variant is chosen exactly once by [`IdentityProvider::from_config`];
//! call sites only ever see the capability set exposed here.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::config::{AuthMode, ConsoleConfig};
use crate::errors::Result;
use crate::identity::external::ExternalIdentity;
use crate::identity::principal::Principal;
use crate::identity::simulated::SimulatedIdentity;
use crate::state::LocalState;

/// Header carrying the active persona's email under simulated identity
pub const SIMULATED_USER_HEADER: &str = "X-Demo-User";

/// Credential the HTTP layer attaches to outgoing requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthHeader {
    Bearer(String),
    SimulatedUser(String),
}

impl AuthHeader {
    pub fn name(&self) -> &'static str {
        match self {
            AuthHeader::Bearer(_) => "Authorization",
            AuthHeader::SimulatedUser(_) => SIMULATED_USER_HEADER,
        }
    }

    pub fn value(&self) -> String {
        match self {
            AuthHeader::Bearer(token) => format!("Bearer {}", token),
            AuthHeader::SimulatedUser(email) => email.clone(),
        }
    }
}

#[derive(Debug)]
pub enum IdentityProvider {
    Simulated(SimulatedIdentity),
    External(ExternalIdentity),
}

impl IdentityProvider {
    /// Factory: pick the variant named by `config.auth_mode`
    pub fn from_config(config: &ConsoleConfig, state: &LocalState) -> Result<Arc<Self>> {
        let provider = match config.auth_mode {
            AuthMode::Demo => IdentityProvider::Simulated(SimulatedIdentity::with_default_roster(
                config.tenant_id.clone(),
                &config.super_admin_email,
                Arc::clone(state.local()),
            )?),
            AuthMode::Enterprise => IdentityProvider::External(ExternalIdentity::new()),
        };

        info!(mode = %provider.mode(), "Identity provider selected");
        Ok(Arc::new(provider))
    }

    pub fn mode(&self) -> AuthMode {
        match self {
            IdentityProvider::Simulated(_) => AuthMode::Demo,
            IdentityProvider::External(_) => AuthMode::Enterprise,
        }
    }

    pub fn principal(&self) -> Principal {
        match self {
            IdentityProvider::Simulated(s) => s.principal(),
            IdentityProvider::External(e) => e.principal(),
        }
    }

    /// Receiver that observes every principal change
    pub fn subscribe(&self) -> watch::Receiver<Principal> {
        match self {
            IdentityProvider::Simulated(s) => s.subscribe(),
            IdentityProvider::External(e) => e.subscribe(),
        }
    }

    /// Bearer token for the current principal; always `None` in demo mode
    pub async fn access_token(&self) -> Option<String> {
        match self {
            IdentityProvider::Simulated(_) => None,
            IdentityProvider::External(e) => e.access_token().await,
        }
    }

    /// Header the HTTP layer should inject, if any
    pub async fn auth_header(&self) -> Option<AuthHeader> {
        match self {
            IdentityProvider::Simulated(s) => s
                .principal()
                .email()
                .map(|email| AuthHeader::SimulatedUser(email.to_string())),
            IdentityProvider::External(e) => e.access_token().await.map(AuthHeader::Bearer),
        }
    }

    pub fn as_simulated(&self) -> Option<&SimulatedIdentity> {
        match self {
            IdentityProvider::Simulated(s) => Some(s),
            IdentityProvider::External(_) => None,
        }
    }
}
