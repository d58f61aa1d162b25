//! Externally issued identity
//!
//! Token acquisition belongs to the identity broker and is not part of this
//! crate. The stub always reports an unauthenticated principal and no token.

use tokio::sync::watch;

use crate::identity::principal::Principal;

#[derive(Debug)]
pub struct ExternalIdentity {
    principal: watch::Sender<Principal>,
}

impl ExternalIdentity {
    pub fn new() -> Self {
        let (principal, _) = watch::channel(Principal::anonymous());
        ExternalIdentity { principal }
    }

    pub fn principal(&self) -> Principal {
        self.principal.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Principal> {
        self.principal.subscribe()
    }

    pub async fn access_token(&self) -> Option<String> {
        None
    }
}

impl Default for ExternalIdentity {
    fn default() -> Self {
        Self::new()
    }
}
