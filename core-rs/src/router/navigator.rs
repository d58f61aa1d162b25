//! Current location and navigation history

use std::sync::Mutex;

use tokio::sync::watch;
use tracing::{info, warn};

/// How the location was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationKind {
    /// Regular in-app navigation, subject to guard evaluation
    Push,
    /// Followed a guard redirect
    Redirect,
    /// Forced jump that bypasses guards (authorization lost mid-session)
    Hard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub kind: NavigationKind,
}

#[derive(Debug)]
pub struct Navigator {
    location: watch::Sender<Location>,
    history: Mutex<Vec<Location>>,
}

impl Navigator {
    pub fn new(initial_path: &str) -> Self {
        let initial = Location {
            path: initial_path.to_string(),
            kind: NavigationKind::Push,
        };
        let (location, _) = watch::channel(initial.clone());
        Navigator {
            location,
            history: Mutex::new(vec![initial]),
        }
    }

    pub fn current(&self) -> Location {
        self.location.borrow().clone()
    }

    pub fn current_path(&self) -> String {
        self.location.borrow().path.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Location> {
        self.location.subscribe()
    }

    pub fn push(&self, path: &str) {
        self.go(path, NavigationKind::Push);
    }

    pub fn redirect(&self, path: &str) {
        self.go(path, NavigationKind::Redirect);
    }

    pub fn hard_navigate(&self, path: &str) {
        warn!(to = path, "Hard navigation");
        self.go(path, NavigationKind::Hard);
    }

    pub fn history(&self) -> Vec<Location> {
        self.history.lock().map(|h| h.clone()).unwrap_or_default()
    }

    fn go(&self, path: &str, kind: NavigationKind) {
        let location = Location {
            path: path.to_string(),
            kind,
        };
        if let Ok(mut history) = self.history.lock() {
            history.push(location.clone());
        }
        info!(path, ?kind, "Navigate");
        self.location.send_replace(location);
    }
}
