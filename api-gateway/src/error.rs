//! Error taxonomy for the Portainer gateway

use thiserror::Error;

/// Missing or invalid connection settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required setting: {0}")]
    Missing(&'static str),
    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("failed to read config from {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config from {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("no default environment resolved")]
    NoDefaultEndpoint,
}

/// Failures of the login / validation pipeline
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("login rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("missing token")]
    MissingToken,
    #[error("failed to list environments with status {status}: {body}")]
    EndpointListFailed { status: u16, body: String },
    #[error("no environments found")]
    NoEnvironments,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl AuthError {
    /// HTTP status attached to the failure, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            AuthError::Rejected { status, .. } | AuthError::EndpointListFailed { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

/// Network, TLS or protocol failure below the HTTP status layer
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("invalid request {path}: {reason}")]
    InvalidRequest { path: String, reason: String },
    #[error("request to {path} failed: {source}")]
    Request {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to read response body from {path}: {source}")]
    Body {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Everything the gateway can hand back to a caller
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
