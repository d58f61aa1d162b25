//! Identity providers
//!
//! Supplies the current [`Principal`] under one of two strategies, chosen once
//! at start-up from [`AuthMode`](crate::config::AuthMode):
//!
//! ```text
//! ConsoleConfig.auth_mode ──► IdentityProvider::from_config
//!                                 ├── Simulated(SimulatedIdentity)  persona roster, X-Demo-User header
//!                                 └── External(ExternalIdentity)    identity broker, bearer token
//! ```

pub mod external;
pub mod principal;
pub mod provider;
pub mod simulated;

pub use external::ExternalIdentity;
pub use principal::{Persona, Principal};
pub use provider::{AuthHeader, IdentityProvider, SIMULATED_USER_HEADER};
pub use simulated::{default_roster, SimulatedIdentity, DEFAULT_TENANT_ID};
