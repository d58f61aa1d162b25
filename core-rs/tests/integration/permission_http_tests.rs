//! Integration tests for the permission endpoint over HTTP
//!
//! A loopback axum server stands in for the console backend. The demo
//! persona selects the server behaviour through the simulated-user header:
//! - super-admin: 200 with a code list
//! - role-manager: 401
//! - auditor: 403
//! - viewer: 200 with a body that is not a code list
//! - slow@...: never answers within the configured timeout

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Json;
use tokio::net::TcpListener;

use scc_core::api::{PERMISSIONS_PATH, REQUEST_ID_HEADER};
use scc_core::identity::{Persona, SIMULATED_USER_HEADER};
use scc_core::rbac::codes::{ADMIN_GLOBAL, AUDIT_READ, ROLE_CREATE, ROLE_READ};
use scc_core::router::NavigationKind;
use scc_core::routes::keys;
use scc_core::state::PERSONA_KEY;
use scc_core::{
    ApiClient, AuthEvents, AuthSignal, ConsoleConfig, ConsoleContext, IdentityProvider, LocalState,
    PermissionOrigin, RouteRegistry, Router, SccError, SimulatedIdentity,
};

// ==================== Test Server ====================

#[derive(Clone, Default)]
struct Seen {
    headers: Arc<Mutex<Vec<HeaderMap>>>,
}

async fn permissions(seen: Seen, headers: HeaderMap) -> Response {
    let user = headers
        .get(SIMULATED_USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    seen.headers.lock().unwrap().push(headers);

    match user.as_str() {
        "admin@scc.local" => Json(vec![ROLE_READ, ROLE_CREATE, ADMIN_GLOBAL]).into_response(),
        "roles@scc.local" => StatusCode::UNAUTHORIZED.into_response(),
        "auditor@scc.local" => StatusCode::FORBIDDEN.into_response(),
        "viewer@scc.local" => Json(serde_json::json!({"permissions": "everything"})).into_response(),
        "slow@scc.local" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(vec![ADMIN_GLOBAL]).into_response()
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn serve() -> (SocketAddr, Seen) {
    let seen = Seen::default();
    let handler_seen = seen.clone();
    let app = axum::Router::new().route(
        &format!("/api{}", PERMISSIONS_PATH),
        get(move |headers: HeaderMap| permissions(handler_seen.clone(), headers)),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, seen)
}

// ==================== Test Helper Functions ====================

fn config(addr: SocketAddr) -> ConsoleConfig {
    ConsoleConfig {
        api_base: format!("http://{}/api", addr),
        permission_fetch_timeout_ms: 500,
        ..ConsoleConfig::default()
    }
}

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

fn start_as(addr: SocketAddr, persona: &str) -> ConsoleContext<String> {
    let state = LocalState::in_memory();
    state.local().set(PERSONA_KEY, persona).unwrap();
    ConsoleContext::start(config(addr), state, compose).unwrap()
}

// ==================== Tests ====================

#[tokio::test]
async fn remote_codes_are_loaded() {
    let (addr, seen) = serve().await;
    let ctx = start_as(addr, "super-admin");

    let state = ctx.permissions().settled().await;
    assert_eq!(state.origin, PermissionOrigin::Remote);
    assert!(!state.is_error);
    assert!(state.permissions.contains(ROLE_CREATE));
    assert!(!state.permissions.contains(AUDIT_READ));

    let headers = seen.headers.lock().unwrap();
    let first = headers.first().expect("request reached the server");
    assert_eq!(first.get(SIMULATED_USER_HEADER).unwrap(), "admin@scc.local");
    assert!(first.get(REQUEST_ID_HEADER).is_some());
    assert!(first.get("authorization").is_none());
}

#[tokio::test]
async fn forbidden_response_applies_fallback_and_hard_navigates() {
    let (addr, _) = serve().await;
    let ctx = start_as(addr, "auditor");
    let mut location = ctx.navigator().subscribe();

    let state = ctx.permissions().settled().await;
    assert!(state.is_error);
    assert!(state.permissions.contains(ROLE_READ));
    assert!(!state.permissions.contains(ADMIN_GLOBAL));

    let landed = location
        .wait_for(|l| l.kind == NavigationKind::Hard)
        .await
        .unwrap()
        .clone();
    assert_eq!(landed.path, "/forbidden");
    assert!(!ctx.reauth_required());
}

#[tokio::test]
async fn unauthorized_response_requires_reauthentication() {
    let (addr, _) = serve().await;
    let ctx = start_as(addr, "role-manager");
    let mut location = ctx.navigator().subscribe();

    ctx.permissions().settled().await;
    location.wait_for(|l| l.path == "/login").await.unwrap();
    assert!(ctx.reauth_required());
}

#[tokio::test]
async fn malformed_payload_falls_back() {
    let (addr, _) = serve().await;
    let ctx = start_as(addr, "viewer");

    let state = ctx.permissions().settled().await;
    assert!(state.is_error);
    assert_eq!(state.origin, PermissionOrigin::Fallback);
    assert!(ctx.has_permission(Some(ROLE_READ)));
    assert!(!ctx.has_permission(Some(ADMIN_GLOBAL)));
}

#[tokio::test]
async fn client_classifies_statuses() {
    let (addr, _) = serve().await;
    let cfg = config(addr);
    let events = AuthEvents::new();
    let mut signals = events.subscribe();

    let roster = vec![
        Persona::new("auditor", "u-1", "Auditor", "auditor@scc.local", "Auditor"),
        Persona::new("broken", "u-2", "Broken", "broken@scc.local", "Nobody"),
        Persona::new("viewer", "u-3", "Viewer", "viewer@scc.local", "Viewer"),
    ];
    let simulated = SimulatedIdentity::new(roster, None, LocalState::in_memory().local().clone()).unwrap();
    let identity = Arc::new(IdentityProvider::Simulated(simulated));
    let api = ApiClient::new(&cfg, Arc::clone(&identity), events.clone()).unwrap();

    assert!(matches!(api.fetch_permissions().await, Err(SccError::Forbidden)));
    assert_eq!(signals.recv().await.unwrap(), AuthSignal::Forbidden);

    identity.as_simulated().unwrap().switch_persona("broken").unwrap();
    assert!(matches!(
        api.fetch_permissions().await,
        Err(SccError::HttpStatus { status: 500, .. })
    ));

    identity.as_simulated().unwrap().switch_persona("viewer").unwrap();
    assert!(matches!(api.fetch_permissions().await, Err(SccError::MalformedPayload(_))));
}

#[tokio::test]
async fn slow_backend_times_out_into_fallback() {
    let (addr, _) = serve().await;
    let roster = vec![Persona::new("slow", "u-9", "Slow", "slow@scc.local", "Viewer")];
    let cfg = ConsoleConfig {
        permission_fetch_timeout_ms: 200,
        ..config(addr)
    };
    let identity = Arc::new(IdentityProvider::Simulated(
        SimulatedIdentity::new(roster, None, LocalState::in_memory().local().clone()).unwrap(),
    ));
    let api = ApiClient::new(&cfg, identity, AuthEvents::new()).unwrap();

    let started = std::time::Instant::now();
    let result = api.fetch_permissions().await;
    assert!(matches!(result, Err(SccError::PermissionFetchTimeout(200))));
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn unreachable_backend_falls_back() {
    // bind then drop to get a port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let ctx = start_as(addr, "super-admin");
    let state = ctx.permissions().settled().await;
    assert!(state.is_error);
    assert!(ctx.has_permission(Some(ADMIN_GLOBAL)));
}
