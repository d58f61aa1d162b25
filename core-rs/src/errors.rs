//! Error types for SCC Core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SccError {
    #[error("Unknown route key: {0}")]
    UnknownRouteKey(String),

    #[error("Duplicate route key: {0}")]
    DuplicateRouteKey(String),

    #[error("Duplicate route path: {0}")]
    DuplicatePath(String),

    #[error("Registry entry has no route binding: {0}")]
    UnroutedPath(String),

    #[error("Route is bound twice: {0}")]
    DuplicateBinding(String),

    #[error("Invalid permission code: {0}")]
    InvalidPermissionCode(String),

    #[error("Permission fetch failed: {0}")]
    PermissionFetch(String),

    #[error("Permission fetch timed out after {0} ms")]
    PermissionFetchTimeout(u64),

    #[error("Request to {path} failed with status {status}")]
    HttpStatus { status: u16, path: String },

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden")]
    Forbidden,

    #[error("Unknown persona: {0}")]
    UnknownPersona(String),

    #[error("Persona switching is only available with simulated identity")]
    PersonaSwitchUnavailable,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, SccError>;
