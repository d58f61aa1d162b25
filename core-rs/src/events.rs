//! Authentication / authorization signals
//!
//! Any API call that sees 401 or 403 publishes here; the console root listens
//! and forces re-authentication or a hard navigation to the forbidden page.

use tokio::sync::broadcast;
use tracing::debug;

const CHANNEL_CAPACITY: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSignal {
    /// Credentials missing or expired (HTTP 401)
    Unauthorized,
    /// Authorization lost mid-session (HTTP 403)
    Forbidden,
}

#[derive(Debug, Clone)]
pub struct AuthEvents {
    sender: broadcast::Sender<AuthSignal>,
}

impl AuthEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        AuthEvents { sender }
    }

    /// Publish a signal; dropped silently when nobody listens
    pub fn publish(&self, signal: AuthSignal) {
        let receivers = self.sender.send(signal).unwrap_or(0);
        debug!(?signal, receivers, "Published auth signal");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthSignal> {
        self.sender.subscribe()
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}
