//! Console application root
//!
//! Constructs every shared collaborator exactly once and hands them out by
//! reference: one identity provider, one permission store, one query cache,
//! one navigator. Tests tear the whole graph down with [`ConsoleContext::shutdown`].
//!
//! ```text
//! ConsoleConfig ─► IdentityProvider ─► PermissionStore ─► Router (guards) ─► pages
//!                        │                   ▲
//!                        └─ persona switch ──┘ (reload + cache invalidation)
//! AuthEvents ─► listener ─► Navigator (hard navigation on 401/403)
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::config::ConsoleConfig;
use crate::errors::{Result, SccError};
use crate::events::{AuthEvents, AuthSignal};
use crate::identity::{IdentityProvider, Principal};
use crate::query::QueryCache;
use crate::rbac::{FallbackPolicy, PermissionSource, PermissionState, PermissionStore};
use crate::router::{MountedRoute, Navigation, Navigator, Router};
use crate::routes::{keys, RouteRegistry};
use crate::state::{LocalState, BANNER_DISMISSED_KEY};

pub struct ConsoleContext<P> {
    config: ConsoleConfig,
    state: LocalState,
    registry: Arc<RouteRegistry>,
    identity: Arc<IdentityProvider>,
    events: AuthEvents,
    cache: Arc<QueryCache>,
    api: ApiClient,
    permissions: Arc<PermissionStore>,
    router: Arc<Router<P>>,
    navigator: Arc<Navigator>,
    reauth_required: Arc<AtomicBool>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl<P> ConsoleContext<P> {
    /// Start the console against the configured backend
    pub fn start<F>(config: ConsoleConfig, state: LocalState, compose: F) -> Result<Self>
    where
        F: FnOnce(Arc<RouteRegistry>) -> Result<Router<P>>,
    {
        Self::start_with_source(config, state, None, compose)
    }

    /// Start with an explicit permission source (`None`: the HTTP endpoint)
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_with_source<F>(
        config: ConsoleConfig,
        state: LocalState,
        source: Option<Arc<dyn PermissionSource>>,
        compose: F,
    ) -> Result<Self>
    where
        F: FnOnce(Arc<RouteRegistry>) -> Result<Router<P>>,
    {
        config.validate()?;

        let registry = Arc::new(RouteRegistry::console()?);
        let router = Arc::new(compose(Arc::clone(&registry))?);

        let identity = IdentityProvider::from_config(&config, &state)?;
        let events = AuthEvents::new();
        let api = ApiClient::new(&config, Arc::clone(&identity), events.clone())?;

        let source: Arc<dyn PermissionSource> = match source {
            Some(source) => source,
            None => Arc::new(api.clone()),
        };

        let permissions = Arc::new(PermissionStore::spawn(
            Arc::clone(&identity),
            source,
            FallbackPolicy::for_mode(config.auth_mode, &config.super_admin_email),
            config.permission_fetch_timeout(),
        ));

        let navigator = Arc::new(Navigator::new(registry.get_path(keys::DASHBOARD)?));
        let reauth_required = Arc::new(AtomicBool::new(false));

        let listener = spawn_signal_listener(
            events.clone(),
            Arc::clone(&navigator),
            Arc::clone(&reauth_required),
            router.guard_paths().login.clone(),
            router.guard_paths().forbidden.clone(),
        );

        info!(mode = %config.auth_mode, api = %config.api_base, "Console context started");

        Ok(ConsoleContext {
            config,
            state,
            registry,
            identity,
            events,
            cache: Arc::new(QueryCache::new()),
            api,
            permissions,
            router,
            navigator,
            reauth_required,
            listener: Mutex::new(Some(listener)),
        })
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<RouteRegistry> {
        &self.registry
    }

    pub fn identity(&self) -> &Arc<IdentityProvider> {
        &self.identity
    }

    pub fn events(&self) -> &AuthEvents {
        &self.events
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn permissions(&self) -> &Arc<PermissionStore> {
        &self.permissions
    }

    pub fn router(&self) -> &Arc<Router<P>> {
        &self.router
    }

    pub fn navigator(&self) -> &Arc<Navigator> {
        &self.navigator
    }

    pub fn principal(&self) -> Principal {
        self.identity.principal()
    }

    pub fn permission_state(&self) -> PermissionState {
        self.permissions.state()
    }

    pub fn has_permission(&self, code: Option<&str>) -> bool {
        self.permissions.has_permission(code)
    }

    pub fn reload_permissions(&self) -> u64 {
        self.permissions.reload()
    }

    /// Navigate to `path` through the guard chain
    ///
    /// A denial moves the navigator to the redirect target.
    pub fn navigate(&self, path: &str) -> Navigation<P> {
        let navigation = self
            .router
            .resolve(path, &self.identity.principal(), &self.permissions.state());

        match &navigation {
            Navigation::Redirect { to, .. } => {
                self.navigator.push(path);
                self.navigator.redirect(to);
            }
            Navigation::NotFound { .. } => match self.registry.get_path(keys::NOT_FOUND) {
                Ok(not_found) => self.navigator.redirect(not_found),
                Err(_) => self.navigator.push(path),
            },
            _ => self.navigator.push(path),
        }

        navigation
    }

    /// Keep `path` mounted; its guard state follows identity and permission changes
    pub fn mount(&self, path: &str) -> MountedRoute<P> {
        MountedRoute::new(
            Arc::clone(&self.router),
            path,
            self.identity.subscribe(),
            self.permissions.subscribe(),
        )
    }

    /// Wait for a mounted route to leave `Pending` and follow a denial
    pub async fn settle(&self, mounted: &mut MountedRoute<P>) -> Navigation<P> {
        let navigation = mounted.settled().await;
        if let Navigation::Redirect { to, .. } = &navigation {
            self.navigator.redirect(to);
        }
        navigation
    }

    /// Swap the simulated persona
    ///
    /// Publishes the new principal, drops all cached server data and forces a
    /// permission reload.
    pub fn switch_persona(&self, persona_id: &str) -> Result<()> {
        let simulated = self
            .identity
            .as_simulated()
            .ok_or(SccError::PersonaSwitchUnavailable)?;

        simulated.switch_persona(persona_id)?;
        let dropped = self.cache.invalidate_all();
        let generation = self.permissions.reload();
        debug!(persona = persona_id, dropped, generation, "Persona switch applied");
        Ok(())
    }

    pub fn reauth_required(&self) -> bool {
        self.reauth_required.load(Ordering::SeqCst)
    }

    /// Non-production banner: demo mode and not dismissed this session
    pub fn demo_banner_visible(&self) -> bool {
        self.config.auth_mode.is_demo() && self.state.session().get(BANNER_DISMISSED_KEY).is_none()
    }

    pub fn dismiss_demo_banner(&self) -> Result<()> {
        self.state.session().set(BANNER_DISMISSED_KEY, "true")
    }

    /// Stop background tasks; the context is inert afterwards
    pub fn shutdown(&self) {
        self.permissions.shutdown();
        if let Ok(mut listener) = self.listener.lock() {
            if let Some(handle) = listener.take() {
                handle.abort();
            }
        }
        info!("Console context shut down");
    }
}

impl<P> Drop for ConsoleContext<P> {
    fn drop(&mut self) {
        if let Ok(mut listener) = self.listener.lock() {
            if let Some(handle) = listener.take() {
                handle.abort();
            }
        }
    }
}

fn spawn_signal_listener(
    events: AuthEvents,
    navigator: Arc<Navigator>,
    reauth_required: Arc<AtomicBool>,
    login_path: String,
    forbidden_path: String,
) -> JoinHandle<()> {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(AuthSignal::Forbidden) => {
                    warn!("Authorization lost, leaving current page");
                    navigator.hard_navigate(&forbidden_path);
                }
                Ok(AuthSignal::Unauthorized) => {
                    warn!("Authentication expired, re-authentication required");
                    reauth_required.store(true, Ordering::SeqCst);
                    navigator.hard_navigate(&login_path);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Auth signal listener lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
