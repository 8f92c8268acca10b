//! Session manager: JWT/CSRF login, token cache, default environment
//!
//! Expiry is checked lazily on access; there is no background refresh.
//! A refresh stages token, CSRF value and default environment locally and
//! commits them in one write once the environment list has validated the
//! new token. A failed or abandoned refresh leaves the previous session as
//! it was.
//!
//! Concurrent callers that find the cache stale may each run their own
//! refresh; every commit is self-consistent and the last one wins.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::ConnectionConfig;
use crate::csrf::{self, CSRF_HEADER, SETTINGS_CSRF_HEADER};
use crate::endpoint::{Endpoint, EndpointId};
use crate::error::{AuthError, ConfigError, GatewayError, Result};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

pub const AUTH_PATH: &str = "/api/auth";
pub const ENDPOINTS_PATH: &str = "/api/endpoints";

/// Bearer token plus the anti-CSRF value that goes with it
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub csrf_token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("csrf_token", &self.csrf_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// State of one successful login. Token and issue time only exist together.
#[derive(Clone)]
struct Login {
    credentials: Credentials,
    issued_at: DateTime<Utc>,
    default_endpoint: EndpointId,
}

impl Login {
    fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let age_ms = now.signed_duration_since(self.issued_at).num_milliseconds();
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        age_ms <= ttl_ms
    }
}

#[derive(Deserialize)]
struct AuthResponse {
    #[serde(default)]
    jwt: Option<String>,
}

pub struct SessionManager {
    config: ConnectionConfig,
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    session: RwLock<Option<Login>>,
}

impl SessionManager {
    pub fn new(config: ConnectionConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_clock(config, transport, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: ConnectionConfig,
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            transport,
            clock,
            session: RwLock::new(None),
        }
    }

    pub fn connection(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Return a valid bearer token, logging in again if the cache is empty or stale
    pub async fn ensure_token(&self) -> Result<String> {
        Ok(self.ensure_credentials().await?.token)
    }

    /// Token and CSRF value of a valid session
    pub async fn ensure_credentials(&self) -> Result<Credentials> {
        Ok(self.ensure_login().await?.credentials)
    }

    /// Identifier of the first environment seen by the current login
    pub async fn ensure_default_endpoint(&self) -> Result<EndpointId> {
        self.ensure_token().await?;
        self.cached_default_endpoint()
            .await
            .ok_or_else(|| ConfigError::NoDefaultEndpoint.into())
    }

    /// Caller-supplied environment, or the default one
    pub async fn resolve_endpoint(&self, explicit: Option<EndpointId>) -> Result<EndpointId> {
        match explicit {
            Some(id) => Ok(id),
            None => self.ensure_default_endpoint().await,
        }
    }

    /// Header set for an authenticated call, built fresh from the given credentials
    pub fn authorized_headers(&self, credentials: &Credentials, request: HttpRequest) -> HttpRequest {
        csrf::authorize(
            request,
            &self.config.base_url,
            &credentials.token,
            credentials.csrf_token.as_deref(),
        )
    }

    /// Ensure a valid session, then send `request` with its authentication headers
    pub async fn send_authorized(&self, request: HttpRequest) -> Result<HttpResponse> {
        let credentials = self.ensure_credentials().await?;
        let request = self.authorized_headers(&credentials, request);
        Ok(self.transport.send(request).await?)
    }

    pub async fn cached_token(&self) -> Option<String> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|login| login.credentials.token.clone())
    }

    pub async fn cached_default_endpoint(&self) -> Option<EndpointId> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|login| login.default_endpoint)
    }

    /// Drop the cached login; the next call logs in again
    pub async fn invalidate(&self) {
        *self.session.write().await = None;
    }

    async fn ensure_login(&self) -> Result<Login> {
        let now = self.clock.now();
        if let Some(login) = self.session.read().await.as_ref() {
            if login.is_fresh(now, self.config.token_ttl) {
                return Ok(login.clone());
            }
            debug!("Cached Portainer token expired, refreshing");
        }
        self.refresh().await
    }

    async fn refresh(&self) -> Result<Login> {
        let base_url = self.config.base_url.as_str();
        info!("Logging in to Portainer at {base_url} as {}", self.config.username);

        // The login request is built from scratch: no previous CSRF or bearer header
        let pre_login_csrf = csrf::fetch_settings_csrf(self.transport.as_ref(), base_url).await;

        let mut request = csrf::with_origin(HttpRequest::post(AUTH_PATH), base_url).json(
            serde_json::json!({
                "Username": self.config.username,
                "Password": self.config.password,
            }),
        );
        if let Some(token) = &pre_login_csrf {
            request = request.header(SETTINGS_CSRF_HEADER, token.as_str());
        }

        let response = self.transport.send(request).await?;
        if !response.is_success() {
            warn!("Portainer login rejected: {}", response.status);
            return Err(AuthError::Rejected {
                status: response.status,
                body: response.text(),
            }
            .into());
        }

        let auth: AuthResponse = response
            .json()
            .map_err(|e| AuthError::InvalidResponse(format!("login response: {e}")))?;
        let token = auth
            .jwt
            .filter(|jwt| !jwt.is_empty())
            .ok_or(AuthError::MissingToken)?;
        let issued_at = self.clock.now();

        let csrf_token = match csrf::csrf_from_response(&response, CSRF_HEADER) {
            Some(token) => Some(token),
            None => csrf::fetch_settings_csrf(self.transport.as_ref(), base_url).await,
        };

        let credentials = Credentials { token, csrf_token };
        let endpoints = self.validate(&credentials).await?;
        let default_endpoint = endpoints
            .first()
            .map(|ep| ep.id)
            .ok_or(AuthError::NoEnvironments)?;

        let login = Login {
            credentials,
            issued_at,
            default_endpoint,
        };
        *self.session.write().await = Some(login.clone());

        info!(
            "Portainer login succeeded: {} environment(s), default {default_endpoint}, csrf={}",
            endpoints.len(),
            login.credentials.csrf_token.is_some()
        );
        Ok(login)
    }

    /// List environments with fresh credentials; a token that cannot do this is unusable
    async fn validate(&self, credentials: &Credentials) -> Result<Vec<Endpoint>> {
        let request = self.authorized_headers(credentials, HttpRequest::get(ENDPOINTS_PATH));
        let response = self.transport.send(request).await?;
        if !response.is_success() {
            return Err(AuthError::EndpointListFailed {
                status: response.status,
                body: response.text(),
            }
            .into());
        }
        response.json().map_err(|e| {
            GatewayError::from(AuthError::InvalidResponse(format!("environment list: {e}")))
        })
    }
}
