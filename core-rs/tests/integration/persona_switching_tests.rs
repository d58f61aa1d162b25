//! Integration tests for demo persona switching
//!
//! Tests the full switch path:
//! - a switch while on a guarded route lands on the forbidden page in place
//! - cached server data from the previous persona is dropped
//! - the active persona survives a restart through the persistent store
//! - a late response for the previous persona never wins

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;

use scc_core::identity::DEFAULT_TENANT_ID;
use scc_core::rbac::codes::{ADMIN_GLOBAL, AUDIT_READ, ROLE_READ};
use scc_core::rbac::testing::{GatedSource, StaticSource};
use scc_core::router::NavigationKind;
use scc_core::routes::keys;
use scc_core::state::PERSONA_KEY;
use scc_core::{
    ConsoleConfig, ConsoleContext, IdentityProvider, LocalState, PermissionSource, RouteRegistry, Router, SccError,
};

// ==================== Test Helper Functions ====================

fn compose(registry: Arc<RouteRegistry>) -> scc_core::Result<Router<String>> {
    let mut builder = Router::builder(Arc::clone(&registry));
    for entry in registry.entries() {
        let key = entry.route_key.clone();
        builder = match entry.route_key.as_str() {
            keys::LOGIN | keys::FORBIDDEN | keys::NOT_FOUND => builder.public(&entry.route_key, move |_| key.clone()),
            _ => builder.protected(&entry.route_key, move |_| key.clone()),
        };
    }
    builder.build()
}

fn grants() -> Arc<StaticSource> {
    Arc::new(
        StaticSource::new()
            .grant("admin@scc.local", &[ROLE_READ, AUDIT_READ, ADMIN_GLOBAL])
            .grant("roles@scc.local", &[ROLE_READ])
            .grant("auditor@scc.local", &[AUDIT_READ]),
    )
}

fn start(state: LocalState, source: Arc<dyn PermissionSource>) -> ConsoleContext<String> {
    ConsoleContext::start_with_source(ConsoleConfig::default(), state, Some(source), compose).unwrap()
}

// ==================== Switching ====================

#[tokio::test]
async fn switch_to_persona_without_access_redirects_in_place() {
    let ctx = start(LocalState::in_memory(), grants());
    ctx.permissions().settled().await;

    ctx.navigate("/roles");
    let mut mounted = ctx.mount("/roles");
    assert!(mounted.state().unwrap().is_allowed());

    ctx.switch_persona("auditor").unwrap();
    let nav = ctx.settle(&mut mounted).await;

    assert_eq!(nav.redirect_target(), Some("/forbidden"));
    let location = ctx.navigator().current();
    assert_eq!(location.path, "/forbidden");
    // client-side redirect, not a hard navigation
    assert_eq!(location.kind, NavigationKind::Redirect);
}

#[tokio::test]
async fn switch_to_persona_with_access_keeps_route() {
    let ctx = start(LocalState::in_memory(), grants());
    ctx.permissions().settled().await;

    let mut mounted = ctx.mount("/roles");
    ctx.switch_persona("role-manager").unwrap();
    let nav = ctx.settle(&mut mounted).await;

    assert_eq!(nav.page().map(String::as_str), Some(keys::ROLES));
    assert!(!ctx.has_permission(Some(ADMIN_GLOBAL)));
}

#[tokio::test]
async fn switch_drops_cached_server_data() {
    let ctx = start(LocalState::in_memory(), grants());
    ctx.permissions().settled().await;

    ctx.cache().insert("roles:list", json!([{"id": "r-1", "name": "Operators"}]));
    ctx.cache().insert("audit:page:1", json!({"items": []}));
    assert_eq!(ctx.cache().len(), 2);

    ctx.switch_persona("viewer").unwrap();
    assert!(ctx.cache().is_empty());
    assert!(ctx.cache().get("roles:list").is_none());
}

#[tokio::test]
async fn unknown_persona_is_rejected_without_side_effects() {
    let ctx = start(LocalState::in_memory(), grants());
    ctx.permissions().settled().await;
    ctx.cache().insert("roles:list", json!([]));

    let err = ctx.switch_persona("intruder").unwrap_err();
    assert!(matches!(err, SccError::UnknownPersona(ref id) if id == "intruder"));
    assert_eq!(ctx.cache().len(), 1);
    assert_eq!(ctx.principal().email(), Some("admin@scc.local"));
}

#[tokio::test]
async fn stale_response_for_previous_persona_is_dropped() {
    let source = Arc::new(GatedSource::new());
    let ctx = start(LocalState::in_memory(), source.clone());
    source.wait_for_calls(1).await;

    ctx.switch_persona("auditor").unwrap();
    source.wait_for_calls(2).await;

    // auditor answers first, then the super-admin response arrives late
    assert!(source.resolve(1, Ok(vec![AUDIT_READ.to_string()])));
    let state = ctx.permissions().settled().await;
    source.resolve(0, Ok(vec![ADMIN_GLOBAL.to_string()]));
    tokio::task::yield_now().await;

    assert!(state.permissions.contains(AUDIT_READ));
    assert!(!ctx.has_permission(Some(ADMIN_GLOBAL)));
    assert!(ctx.has_permission(Some(AUDIT_READ)));
}

// ==================== Persistence ====================

#[tokio::test]
async fn active_persona_survives_restart() {
    let temp = TempDir::new().unwrap();

    {
        let ctx = start(LocalState::persistent(temp.path()).unwrap(), grants());
        ctx.switch_persona("auditor").unwrap();
        ctx.shutdown();
    }

    let state = LocalState::persistent(temp.path()).unwrap();
    assert_eq!(state.local().get(PERSONA_KEY).as_deref(), Some("auditor"));

    let ctx = start(state, grants());
    assert_eq!(ctx.principal().email(), Some("auditor@scc.local"));
    assert_eq!(ctx.principal().tenant_id(), Some(DEFAULT_TENANT_ID));
}

#[tokio::test]
async fn banner_dismissal_does_not_outlive_session() {
    let temp = TempDir::new().unwrap();

    let ctx = start(LocalState::persistent(temp.path()).unwrap(), grants());
    assert!(ctx.demo_banner_visible());
    ctx.dismiss_demo_banner().unwrap();
    assert!(!ctx.demo_banner_visible());
    ctx.shutdown();
    drop(ctx);

    let ctx = start(LocalState::persistent(temp.path()).unwrap(), grants());
    assert!(ctx.demo_banner_visible());
}

#[tokio::test]
async fn tenant_override_applies_to_every_persona() {
    let config = ConsoleConfig {
        tenant_id: Some("tenant-acme".to_string()),
        ..ConsoleConfig::default()
    };
    let state = LocalState::in_memory();
    let identity = IdentityProvider::from_config(&config, &state).unwrap();
    let simulated = identity.as_simulated().unwrap();

    for persona in simulated.roster().to_vec() {
        simulated.switch_persona(&persona.id).unwrap();
        assert_eq!(identity.principal().tenant_id(), Some("tenant-acme"));
    }
}
