//! Permission Store
//!
//! Single-writer cache of the current principal's permission codes. Only the
//! store's own fetch lifecycle writes the state; consumers read snapshots,
//! subscribe to changes or request a reload.
//!
//! Lifecycle per fetch:
//! 1. unauthenticated principal: empty set, not loading, no error
//! 2. authenticated: loading, then the remote result
//! 3. failure (transport, status, payload, timeout): fallback set + error flag
//!
//! Every fetch carries a generation number. A result is applied only while its
//! generation is still the newest, so a slow superseded fetch can never
//! overwrite the outcome of a later one.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{Result, SccError};
use crate::identity::{IdentityProvider, Principal};
use crate::rbac::codes::PermissionCode;
use crate::rbac::fallback::FallbackPolicy;
use crate::rbac::source::PermissionSource;

type IdentityKey = (bool, Option<String>, Option<String>);

fn identity_key(principal: &Principal) -> IdentityKey {
    let (authenticated, user, tenant) = principal.identity_key();
    (authenticated, user.map(str::to_string), tenant.map(str::to_string))
}

/// Where the current permission set came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionOrigin {
    #[default]
    None,
    Remote,
    Fallback,
}

/// Snapshot of the authorization state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PermissionState {
    pub permissions: BTreeSet<String>,
    pub is_loading: bool,
    pub is_error: bool,
    pub origin: PermissionOrigin,
}

impl PermissionState {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn loading() -> Self {
        PermissionState {
            is_loading: true,
            ..Self::default()
        }
    }

    pub fn loaded<I, S>(codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PermissionState {
            permissions: codes.into_iter().map(Into::into).collect(),
            is_loading: false,
            is_error: false,
            origin: PermissionOrigin::Remote,
        }
    }

    /// Non-routing permission check for nav items and buttons
    ///
    /// `false` while loading or for a missing code.
    pub fn has_permission(&self, code: Option<&str>) -> bool {
        match code {
            Some(code) if !self.is_loading => self.permissions.contains(code),
            _ => false,
        }
    }
}

struct StoreInner {
    identity: Arc<IdentityProvider>,
    source: Arc<dyn PermissionSource>,
    fallback: FallbackPolicy,
    timeout: Duration,
    generation: AtomicU64,
    last_key: Mutex<Option<IdentityKey>>,
    in_flight: Mutex<Option<JoinHandle<()>>>,
    state: watch::Sender<PermissionState>,
}

impl StoreInner {
    /// Start a fetch for the current principal and return its generation
    ///
    /// The principal is read, `last_key` updated and the generation allocated
    /// under the state lock, so the newest generation always fetches for the
    /// principal that was current when it was allocated.
    fn refresh(self: &Arc<Self>) -> u64 {
        let mut generation = 0;
        let mut principal = Principal::anonymous();

        self.state.send_modify(|state| {
            principal = self.identity.principal();
            let key = identity_key(&principal);

            let identity_changed = match self.last_key.lock() {
                Ok(mut last) => {
                    let changed = last.as_ref() != Some(&key);
                    *last = Some(key);
                    changed
                }
                Err(_) => true,
            };

            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            if !principal.is_authenticated() {
                *state = PermissionState::empty();
            } else if identity_changed {
                *state = PermissionState::loading();
            } else {
                state.is_loading = true;
                state.is_error = false;
            }
        });

        if !principal.is_authenticated() {
            debug!(generation, "Principal unauthenticated, permissions cleared");
            return generation;
        }

        debug!(generation, user = ?principal.user_id(), "Fetching permissions");

        let inner = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let outcome = match tokio::time::timeout(inner.timeout, inner.source.fetch_permissions(&principal)).await {
                Ok(result) => result,
                Err(_) => Err(SccError::PermissionFetchTimeout(inner.timeout.as_millis() as u64)),
            };
            inner.apply(generation, &principal, outcome);
        });

        if let Ok(mut slot) = self.in_flight.lock() {
            *slot = Some(handle);
        }

        generation
    }

    fn apply(&self, generation: u64, principal: &Principal, outcome: Result<Vec<String>>) {
        let next = match outcome {
            Ok(codes) => {
                for code in codes.iter().filter(|c| !PermissionCode::is_well_formed(c)) {
                    warn!(%code, "Backend granted a malformed permission code");
                }
                PermissionState::loaded(codes)
            }
            Err(err) => {
                let permissions = self.fallback.fallback_for(principal);
                warn!(
                    generation,
                    error = %err,
                    fallback = permissions.len(),
                    "Permission fetch failed, applying fallback policy"
                );
                PermissionState {
                    permissions,
                    is_loading: false,
                    is_error: true,
                    origin: PermissionOrigin::Fallback,
                }
            }
        };

        let applied = self.state.send_if_modified(|state| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            *state = next;
            true
        });

        if applied {
            debug!(generation, "Permission state updated");
        } else {
            debug!(generation, "Dropped stale permission response");
        }
    }
}

/// Process-wide permission cache; one per [`ConsoleContext`](crate::console::ConsoleContext)
pub struct PermissionStore {
    inner: Arc<StoreInner>,
    watcher: Mutex<Option<JoinHandle<()>>>,
}

impl PermissionStore {
    /// Mount the store: fetch for the current principal and follow identity changes
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(
        identity: Arc<IdentityProvider>,
        source: Arc<dyn PermissionSource>,
        fallback: FallbackPolicy,
        timeout: Duration,
    ) -> Self {
        let (state, _) = watch::channel(PermissionState::loading());
        let mut identity_rx = identity.subscribe();

        let inner = Arc::new(StoreInner {
            identity,
            source,
            fallback,
            timeout,
            generation: AtomicU64::new(0),
            last_key: Mutex::new(None),
            in_flight: Mutex::new(None),
            state,
        });

        inner.refresh();

        let watcher_inner = Arc::clone(&inner);
        let watcher = tokio::spawn(async move {
            while identity_rx.changed().await.is_ok() {
                let key = identity_key(&identity_rx.borrow_and_update());
                let seen = watcher_inner
                    .last_key
                    .lock()
                    .map(|last| last.as_ref() == Some(&key))
                    .unwrap_or(false);
                if !seen {
                    info!(authenticated = key.0, user = ?key.1, "Identity changed, reloading permissions");
                    watcher_inner.refresh();
                }
            }
        });

        PermissionStore {
            inner,
            watcher: Mutex::new(Some(watcher)),
        }
    }

    /// Force a new fetch; the newest request always wins
    pub fn reload(&self) -> u64 {
        self.inner.refresh()
    }

    pub fn state(&self) -> PermissionState {
        self.inner.state.borrow().clone()
    }

    pub fn permissions(&self) -> BTreeSet<String> {
        self.inner.state.borrow().permissions.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().is_loading
    }

    pub fn is_error(&self) -> bool {
        self.inner.state.borrow().is_error
    }

    pub fn has_permission(&self, code: Option<&str>) -> bool {
        self.inner.state.borrow().has_permission(code)
    }

    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> watch::Receiver<PermissionState> {
        self.inner.state.subscribe()
    }

    /// Wait until no fetch is pending and return that state
    pub async fn settled(&self) -> PermissionState {
        let mut rx = self.subscribe();
        let settled = match rx.wait_for(|state| !state.is_loading).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        settled
    }

    /// Stop following identity changes and discard any pending fetch
    pub fn shutdown(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut watcher) = self.watcher.lock() {
            if let Some(handle) = watcher.take() {
                handle.abort();
            }
        }
        if let Ok(mut in_flight) = self.inner.in_flight.lock() {
            if let Some(handle) = in_flight.take() {
                handle.abort();
            }
        }
        debug!("Permission store shut down");
    }
}

impl Drop for PermissionStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for PermissionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionStore")
            .field("generation", &self.generation())
            .field("state", &self.state())
            .finish()
    }
}
