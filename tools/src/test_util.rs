//! Shared fixtures for tool tests

use portainer_gateway::testing::ScriptedTransport;
use portainer_gateway::{ConnectionConfig, SessionManager};
use serde_json::json;
use std::sync::Arc;

pub const BASE_URL: &str = "https://portainer.local";

/// Transport scripted with one login ("abc", default environment 12)
pub fn logged_in() -> Arc<ScriptedTransport> {
    let transport = Arc::new(ScriptedTransport::new());
    transport.push_login("abc", json!([{"Id": 12, "Name": "local"}]));
    transport
}

pub fn session(transport: &Arc<ScriptedTransport>) -> SessionManager {
    let config = ConnectionConfig::new(BASE_URL, "admin", "secret").unwrap();
    SessionManager::new(config, transport.clone())
}
