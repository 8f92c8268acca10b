//! portainer.test: Check that the configured credentials can log in

use anyhow::{Context, Result};
use portainer_gateway::SessionManager;

use crate::registry::{make_tool, Registry};

pub fn register_tools(reg: &mut Registry) {
    reg.register_tool(make_tool(
        "portainer.test",
        "portainer",
        "Test connectivity: log in with the configured credentials and resolve the default environment",
        vec![],
        "low",
        true,
        30000,
    ));
}

pub async fn execute(session: &SessionManager, _input: &[u8]) -> Result<String> {
    let endpoint = session
        .ensure_default_endpoint()
        .await
        .context("Portainer connection test failed")?;
    Ok(format!(
        "Portainer connection test succeeded: logged in to {} as {}, default environment {endpoint}",
        session.connection().base_url,
        session.connection().username
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{logged_in, session};
    use portainer_gateway::testing::ScriptedTransport;
    use portainer_gateway::HttpResponse;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_connectivity_success() {
        let transport = logged_in();
        let out = execute(&session(&transport), b"").await.unwrap();
        assert_eq!(
            out,
            "Portainer connection test succeeded: logged in to https://portainer.local as admin, default environment 12"
        );
    }

    #[tokio::test]
    async fn test_connectivity_failure() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push("POST /api/auth", HttpResponse::new(401).with_body("bad password"));

        let err = execute(&session(&transport), b"").await.unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.starts_with("Portainer connection test failed"));
        assert!(msg.contains("401"));
    }
}
