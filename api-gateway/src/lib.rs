//! Portainer gateway: authenticated access to the Portainer management API
//!
//! Provides:
//! - Configuration loading (TOML file + PORTAINER_* environment)
//! - JWT login with best-effort anti-CSRF token handling
//! - A TTL token cache with lazy, atomic refresh
//! - Default environment resolution
//! - A narrow transport seam so tool code never builds headers by hand

pub mod clock;
pub mod config;
pub mod csrf;
pub mod endpoint;
pub mod error;
pub mod session;
pub mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use clock::{Clock, SystemClock};
pub use config::{load_config, ConfigSource, ConnectionConfig, GatewayConfig};
pub use endpoint::{Endpoint, EndpointId};
pub use error::{AuthError, ConfigError, GatewayError, Result, TransportError};
pub use session::{Credentials, SessionManager};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport};
