//! A route that stays mounted across principal and permission changes
//!
//! The guard chain is recomputed from the latest principal and permission
//! snapshot on every read, so a denial is never cached: a later grant
//! re-admits the same mounted route and a revoked code denies it, without a
//! new navigation.

use std::sync::Arc;

use tokio::sync::watch;

use crate::guards::GuardState;
use crate::identity::Principal;
use crate::rbac::PermissionState;
use crate::router::composition::{Navigation, Router};

pub struct MountedRoute<P> {
    router: Arc<Router<P>>,
    path: String,
    principal: watch::Receiver<Principal>,
    permissions: watch::Receiver<PermissionState>,
}

impl<P> MountedRoute<P> {
    pub fn new(
        router: Arc<Router<P>>,
        path: &str,
        principal: watch::Receiver<Principal>,
        permissions: watch::Receiver<PermissionState>,
    ) -> Self {
        MountedRoute {
            router,
            path: path.to_string(),
            principal,
            permissions,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn snapshot(&self) -> (Principal, PermissionState) {
        (self.principal.borrow().clone(), self.permissions.borrow().clone())
    }

    /// Guard state from the latest snapshots; `None` if the path is unrouted
    pub fn state(&self) -> Option<GuardState> {
        let (principal, permissions) = self.snapshot();
        self.router.guard_state(&self.path, &principal, &permissions)
    }

    pub fn view(&self) -> Navigation<P> {
        let (principal, permissions) = self.snapshot();
        self.router.resolve(&self.path, &principal, &permissions)
    }

    /// Wait for the next principal or permission change and re-resolve
    ///
    /// Returns the current view immediately if both sources are gone.
    pub async fn changed(&mut self) -> Navigation<P> {
        self.wait_change().await;
        self.view()
    }

    /// Wait until the guard chain leaves `Pending`
    pub async fn settled(&mut self) -> Navigation<P> {
        let mut view = self.view();
        while view.is_loading() {
            if !self.wait_change().await {
                break;
            }
            view = self.view();
        }
        view
    }

    async fn wait_change(&mut self) -> bool {
        tokio::select! {
            Ok(()) = self.principal.changed() => true,
            Ok(()) = self.permissions.changed() => true,
            else => false,
        }
    }
}
