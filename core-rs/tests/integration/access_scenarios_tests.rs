//! Integration tests for guarded navigation
//!
//! Drives the full console stack (identity, permission store, guard chain,
//! router) through the access scenarios an operator hits every day:
//! - signed out on a guarded page
//! - permissions still loading
//! - granted and missing permission codes
//! - backend failure with the demo fallback policy
//! - guard re-evaluation while a route stays mounted

use std::sync::Arc;

use scc_core::rbac::codes::{ADMIN_GLOBAL, AUDIT_READ, MODULE_MANAGE, ROLE_CREATE, ROLE_READ};
use scc_core::rbac::testing::{GatedSource, StaticSource};
use scc_core::rbac::ALL_PERMISSIONS;
use scc_core::routes::keys;
use scc_core::{
    AuthMode, ConsoleConfig, ConsoleContext, DenyReason, GuardState, LocalState, Navigation, PermissionOrigin,
    PermissionSource, RouteRegistry, Router, SccError,
};

// ==================== Test Helper Functions ====================

/// Pages are just their route key
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

fn start(mode: AuthMode, source: Arc<dyn PermissionSource>) -> ConsoleContext<String> {
    let config = ConsoleConfig {
        auth_mode: mode,
        ..ConsoleConfig::default()
    };
    ConsoleContext::start_with_source(config, LocalState::in_memory(), Some(source), compose).unwrap()
}

fn start_as(persona: &str, source: Arc<dyn PermissionSource>) -> ConsoleContext<String> {
    let state = LocalState::in_memory();
    state.local().set(scc_core::state::PERSONA_KEY, persona).unwrap();
    ConsoleContext::start_with_source(ConsoleConfig::default(), state, Some(source), compose).unwrap()
}

// ==================== Scenarios ====================

#[tokio::test]
async fn unauthenticated_principal_is_sent_to_login() {
    let ctx = start(AuthMode::Enterprise, Arc::new(StaticSource::new()));
    let state = ctx.permissions().settled().await;

    assert!(!ctx.principal().is_authenticated());
    assert!(state.permissions.is_empty());
    assert!(!state.is_error);

    let nav = ctx.navigate("/roles");
    assert_eq!(nav.redirect_target(), Some("/login"));
    assert!(matches!(nav, Navigation::Redirect { reason: DenyReason::Unauthenticated, .. }));
    assert_eq!(ctx.navigator().current_path(), "/login");
}

#[tokio::test]
async fn pending_permissions_show_loading_without_redirect() {
    let source = Arc::new(GatedSource::new());
    let ctx = start(AuthMode::Demo, source.clone());
    source.wait_for_calls(1).await;

    assert!(ctx.permissions().is_loading());
    let nav = ctx.navigate("/roles");
    assert!(nav.is_loading());
    assert!(nav.page().is_none());
    assert!(nav.redirect_target().is_none());

    source.resolve(0, Ok(vec![ROLE_READ.to_string()]));
    ctx.permissions().settled().await;
    assert_eq!(ctx.navigate("/roles").page().map(String::as_str), Some(keys::ROLES));
}

#[tokio::test]
async fn granted_code_renders_page() {
    let source = StaticSource::new().grant("admin@scc.local", &[ROLE_READ]);
    let ctx = start(AuthMode::Demo, Arc::new(source));
    let state = ctx.permissions().settled().await;
    assert_eq!(state.origin, PermissionOrigin::Remote);

    let nav = ctx.navigate("/roles");
    assert_eq!(nav.page().map(String::as_str), Some(keys::ROLES));
    assert_eq!(ctx.navigator().current_path(), "/roles");
}

#[tokio::test]
async fn missing_code_is_forbidden() {
    let source = StaticSource::new().grant("admin@scc.local", &[AUDIT_READ]);
    let ctx = start(AuthMode::Demo, Arc::new(source));
    ctx.permissions().settled().await;

    let nav = ctx.navigate("/roles");
    assert_eq!(nav.redirect_target(), Some("/forbidden"));
    match nav {
        Navigation::Redirect { reason, .. } => {
            assert_eq!(reason, DenyReason::MissingPermission(ROLE_READ.to_string()))
        }
        other => panic!("expected redirect, got {:?}", other),
    }
}

#[tokio::test]
async fn failed_fetch_gives_reduced_baseline_to_regular_persona() {
    let ctx = start_as("auditor", Arc::new(StaticSource::new().failing()));
    let state = ctx.permissions().settled().await;

    assert!(state.is_error);
    assert_eq!(state.origin, PermissionOrigin::Fallback);
    assert!(!ctx.has_permission(Some(ADMIN_GLOBAL)));
    assert!(ctx.has_permission(Some(ROLE_READ)));
    assert!(!ctx.has_permission(Some(ROLE_CREATE)));

    assert_eq!(ctx.navigate("/settings").redirect_target(), Some("/forbidden"));
}

#[tokio::test]
async fn failed_fetch_gives_super_admin_everything() {
    let ctx = start_as("super-admin", Arc::new(StaticSource::new().failing()));
    ctx.permissions().settled().await;

    assert!(ctx.has_permission(Some(ADMIN_GLOBAL)));
    assert!(ctx.has_permission(Some(MODULE_MANAGE)));
    assert!(ctx.navigate("/settings").page().is_some());
}

#[tokio::test]
async fn configured_super_admin_email_keeps_full_fallback() {
    let config = ConsoleConfig {
        super_admin_email: "boss@corp.example".to_string(),
        ..ConsoleConfig::default()
    };
    let source: Arc<dyn PermissionSource> = Arc::new(StaticSource::new().failing());
    let ctx = ConsoleContext::start_with_source(config, LocalState::in_memory(), Some(source), compose).unwrap();
    let state = ctx.permissions().settled().await;

    assert!(state.is_error);
    assert_eq!(ctx.principal().email(), Some("boss@corp.example"));
    assert!(ctx.has_permission(Some(ADMIN_GLOBAL)));
    assert_eq!(state.permissions.len(), ALL_PERMISSIONS.len());
}

#[tokio::test]
async fn failed_fetch_in_enterprise_mode_grants_nothing() {
    let ctx = start(AuthMode::Enterprise, Arc::new(StaticSource::new().failing()));
    let state = ctx.permissions().settled().await;
    // anonymous in enterprise mode: nothing was ever fetched
    assert!(state.permissions.is_empty());
    assert!(!ctx.has_permission(Some(ROLE_READ)));
}

// ==================== Mounted routes ====================

#[tokio::test]
async fn revoked_code_denies_mounted_route() {
    let source = Arc::new(StaticSource::new().grant("admin@scc.local", &[ROLE_READ]));
    let ctx = start(AuthMode::Demo, source.clone());
    ctx.permissions().settled().await;

    let mut mounted = ctx.mount("/roles/r-42");
    assert_eq!(mounted.state(), Some(GuardState::Allowed));
    match mounted.view() {
        Navigation::Render { route, .. } => assert_eq!(route.param("roleId"), Some("r-42")),
        other => panic!("expected render, got {:?}", other),
    }

    source.set_grants("admin@scc.local", &[]);
    ctx.reload_permissions();
    let nav = ctx.settle(&mut mounted).await;

    assert_eq!(nav.redirect_target(), Some("/forbidden"));
    assert_eq!(ctx.navigator().current_path(), "/forbidden");
}

#[tokio::test]
async fn later_grant_readmits_mounted_route() {
    let source = Arc::new(StaticSource::new());
    let ctx = start(AuthMode::Demo, source.clone());
    ctx.permissions().settled().await;

    let mut mounted = ctx.mount("/audit-logs");
    assert!(mounted.view().redirect_target().is_some());

    source.set_grants("admin@scc.local", &[AUDIT_READ]);
    ctx.reload_permissions();
    let nav = ctx.settle(&mut mounted).await;
    assert_eq!(nav.page().map(String::as_str), Some(keys::AUDIT_LOGS));
}

// ==================== Properties ====================

#[tokio::test]
async fn nav_entries_never_outnumber_registry() {
    let ctx = start(AuthMode::Demo, Arc::new(StaticSource::new()));
    let registry = ctx.registry();
    let nav = registry.list_nav_entries();

    assert!(nav.len() <= registry.entries().len());
    assert!(nav.iter().all(|e| e.show_in_nav));
    assert!(nav.iter().all(|e| registry.contains(&e.route_key)));
}

#[tokio::test]
async fn authenticated_routes_without_code_need_no_permissions() {
    let ctx = start(AuthMode::Demo, Arc::new(StaticSource::new()));
    ctx.permissions().settled().await;

    assert_eq!(ctx.navigate("/").page().map(String::as_str), Some(keys::DASHBOARD));
    assert_eq!(ctx.navigate("/profile").page().map(String::as_str), Some(keys::PROFILE));
}

#[tokio::test]
async fn unknown_route_key_is_an_error() {
    let ctx = start(AuthMode::Demo, Arc::new(StaticSource::new()));
    assert!(matches!(
        ctx.registry().get_path("reports"),
        Err(SccError::UnknownRouteKey(key)) if key == "reports"
    ));
    assert_eq!(
        ctx.registry().href(keys::MODULE_SETTINGS, &[("moduleId", "billing")]).unwrap(),
        "/modules/billing/settings"
    );
}
