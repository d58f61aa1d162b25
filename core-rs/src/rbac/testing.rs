//! In-process permission sources for tests (feature `test-support`)
//!
//! - [`StaticSource`]: per-email grants, switchable into a failing backend
//! - [`GatedSource`]: every call parks until the test resolves it by index

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::errors::{Result, SccError};
use crate::identity::Principal;
use crate::rbac::source::PermissionSource;

#[derive(Debug, Default)]
pub struct StaticSource {
    grants: Mutex<HashMap<String, Vec<String>>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(self, email: &str, codes: &[&str]) -> Self {
        self.set_grants(email, codes);
        self
    }

    pub fn failing(self) -> Self {
        self.set_failing(true);
        self
    }

    /// Replace the grants for `email`; visible to the next fetch
    pub fn set_grants(&self, email: &str, codes: &[&str]) {
        if let Ok(mut grants) = self.grants.lock() {
            grants.insert(email.to_string(), codes.iter().map(|c| c.to_string()).collect());
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PermissionSource for StaticSource {
    async fn fetch_permissions(&self, principal: &Principal) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.load(Ordering::SeqCst) {
            return Err(SccError::PermissionFetch("backend unreachable".to_string()));
        }

        let grants = self
            .grants
            .lock()
            .map_err(|_| SccError::PermissionFetch("grant table poisoned".to_string()))?;
        Ok(principal
            .email()
            .and_then(|email| grants.get(email).cloned())
            .unwrap_or_default())
    }
}

type Gate = oneshot::Sender<Result<Vec<String>>>;

#[derive(Debug, Default)]
pub struct GatedSource {
    gates: Mutex<Vec<Option<Gate>>>,
    calls: AtomicUsize,
}

impl GatedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Yield until at least `n` fetches have started
    pub async fn wait_for_calls(&self, n: usize) {
        while self.calls() < n {
            tokio::task::yield_now().await;
        }
    }

    /// Answer the `index`-th fetch (0-based); `false` if already answered or abandoned
    pub fn resolve(&self, index: usize, result: Result<Vec<String>>) -> bool {
        let gate = match self.gates.lock() {
            Ok(mut gates) => gates.get_mut(index).and_then(Option::take),
            Err(_) => None,
        };
        match gate {
            Some(tx) => tx.send(result).is_ok(),
            None => false,
        }
    }
}

#[async_trait]
impl PermissionSource for GatedSource {
    async fn fetch_permissions(&self, _principal: &Principal) -> Result<Vec<String>> {
        let (tx, rx) = oneshot::channel();
        if let Ok(mut gates) = self.gates.lock() {
            gates.push(Some(tx));
        }
        self.calls.fetch_add(1, Ordering::SeqCst);

        rx.await
            .unwrap_or_else(|_| Err(SccError::PermissionFetch("gate dropped".to_string())))
    }
}
