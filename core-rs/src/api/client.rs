//! ApiClient for the console backend
//!
//! Provides:
//! - identity header injection (bearer token or simulated user email)
//! - request correlation ids
//! - status classification (401/403 published as auth signals)
//! - JSON decoding with malformed-payload detection

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ConsoleConfig;
use crate::errors::{Result, SccError};
use crate::events::{AuthEvents, AuthSignal};
use crate::identity::IdentityProvider;

/// Relative path returning the current principal's permission codes
pub const PERMISSIONS_PATH: &str = "/me/permissions";

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
    identity: Arc<IdentityProvider>,
    events: AuthEvents,
    timeout: Duration,
}

impl ApiClient {
    /// Create new ApiClient
    ///
    /// The configured permission timeout doubles as the request timeout.
    pub fn new(config: &ConsoleConfig, identity: Arc<IdentityProvider>, events: AuthEvents) -> Result<Self> {
        let timeout = config.permission_fetch_timeout();
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(ApiClient {
            base_url: config.api_base_trimmed().to_string(),
            http,
            identity,
            events,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build full URL for a relative API path
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// GET `path` and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let request_id = Uuid::new_v4().to_string();

        let mut request = self.http.get(&url).header(REQUEST_ID_HEADER, &request_id);
        if let Some(header) = self.identity.auth_header().await {
            request = request.header(header.name(), header.value());
        }

        debug!(%url, %request_id, "GET");

        let response = request.send().await.map_err(|e| self.classify_transport(e))?;
        let status = response.status();

        match status {
            StatusCode::UNAUTHORIZED => {
                warn!(%url, "Request unauthorized");
                self.events.publish(AuthSignal::Unauthorized);
                return Err(SccError::Unauthorized);
            }
            StatusCode::FORBIDDEN => {
                warn!(%url, "Request forbidden");
                self.events.publish(AuthSignal::Forbidden);
                return Err(SccError::Forbidden);
            }
            s if !s.is_success() => {
                return Err(SccError::HttpStatus {
                    status: s.as_u16(),
                    path: path.to_string(),
                });
            }
            _ => {}
        }

        let body = response.bytes().await.map_err(|e| self.classify_transport(e))?;
        serde_json::from_slice(&body).map_err(|e| {
            SccError::MalformedPayload(format!("{} returned unexpected JSON: {}", path, e))
        })
    }

    /// Permission codes granted to the current principal
    ///
    /// The body is a bare JSON array of strings.
    pub async fn fetch_permissions(&self) -> Result<Vec<String>> {
        self.get_json::<Vec<String>>(PERMISSIONS_PATH).await
    }

    fn classify_transport(&self, err: reqwest::Error) -> SccError {
        if err.is_timeout() {
            SccError::PermissionFetchTimeout(self.timeout.as_millis() as u64)
        } else {
            SccError::Http(err)
        }
    }
}
