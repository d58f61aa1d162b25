/**
 * console_config.rs
 * Loader for scc.yaml console configuration
 *
 * Format:
 * ```yaml
 * authMode: demo            # demo | enterprise
 * apiBase: http://localhost:8080/api
 * tenantId: tenant-contoso  # optional, simulated identity only
 * permissionFetchTimeoutMs: 10000
 * superAdminEmail: admin@scc.local
 * stateDir: .scc
 * ```
 *
 * Environment overrides (applied after the file): SCC_AUTH_MODE, SCC_API_BASE,
 * SCC_TENANT_ID, SCC_PERMISSION_TIMEOUT_MS, SCC_STATE_DIR.
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::errors::{Result, SccError};

pub const DEFAULT_API_BASE: &str = "http://localhost:8080/api";
pub const DEFAULT_PERMISSION_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_SUPER_ADMIN_EMAIL: &str = "admin@scc.local";
pub const DEFAULT_STATE_DIR: &str = ".scc";

/// Which identity provider variant the console runs with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    /// Simulated local identity with a persona roster
    Demo,
    /// Externally issued identity (identity broker)
    Enterprise,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::Demo => "demo",
            AuthMode::Enterprise => "enterprise",
        }
    }

    pub fn is_demo(&self) -> bool {
        matches!(self, AuthMode::Demo)
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMode {
    type Err = SccError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "demo" => Ok(AuthMode::Demo),
            "enterprise" | "entra" => Ok(AuthMode::Enterprise),
            other => Err(SccError::Config(format!(
                "Invalid auth mode '{}': expected 'demo' or 'enterprise'",
                other
            ))),
        }
    }
}

/// scc.yaml file structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleConfig {
    pub auth_mode: AuthMode,
    pub api_base: String,
    /// Fixed tenant for every simulated persona
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default = "default_timeout_ms")]
    pub permission_fetch_timeout_ms: u64,
    /// Persona that receives the full fallback set when the fetch fails
    #[serde(default = "default_super_admin_email")]
    pub super_admin_email: String,
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_PERMISSION_TIMEOUT_MS
}

fn default_super_admin_email() -> String {
    DEFAULT_SUPER_ADMIN_EMAIL.to_string()
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_DIR)
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        ConsoleConfig {
            auth_mode: AuthMode::Demo,
            api_base: DEFAULT_API_BASE.to_string(),
            tenant_id: None,
            permission_fetch_timeout_ms: DEFAULT_PERMISSION_TIMEOUT_MS,
            super_admin_email: DEFAULT_SUPER_ADMIN_EMAIL.to_string(),
            state_dir: default_state_dir(),
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(SccError::Config(format!(
                "Config file not found: {}",
                path.to_string_lossy()
            )));
        }

        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: ConsoleConfig = serde_yaml::from_str(content)
            .map_err(|e| SccError::Config(format!("Invalid config YAML: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Resolve the startup configuration: optional file, then process environment
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `SCC_*` overrides from a variable lookup
    ///
    /// The lookup is injected so tests never touch the process environment.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(mode) = lookup("SCC_AUTH_MODE") {
            self.auth_mode = mode.parse()?;
        }
        if let Some(base) = lookup("SCC_API_BASE") {
            self.api_base = base;
        }
        if let Some(tenant) = lookup("SCC_TENANT_ID") {
            self.tenant_id = if tenant.trim().is_empty() { None } else { Some(tenant) };
        }
        if let Some(timeout) = lookup("SCC_PERMISSION_TIMEOUT_MS") {
            self.permission_fetch_timeout_ms = timeout.trim().parse().map_err(|_| {
                SccError::Config(format!("SCC_PERMISSION_TIMEOUT_MS is not a number: {}", timeout))
            })?;
        }
        if let Some(dir) = lookup("SCC_STATE_DIR") {
            self.state_dir = PathBuf::from(dir);
        }

        self.validate()
    }

    /// Validate field values
    pub fn validate(&self) -> Result<()> {
        if self.api_base.trim().is_empty() {
            return Err(SccError::Config("apiBase cannot be empty".to_string()));
        }

        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(SccError::Config(format!(
                "apiBase must be an http(s) URL, got '{}'",
                self.api_base
            )));
        }

        if self.permission_fetch_timeout_ms == 0 {
            return Err(SccError::Config(
                "permissionFetchTimeoutMs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn permission_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.permission_fetch_timeout_ms)
    }

    /// API base without a trailing slash
    pub fn api_base_trimmed(&self) -> &str {
        self.api_base.trim_end_matches('/')
    }
}
