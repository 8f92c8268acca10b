//! Tool execution pipeline
//!
//! Pipeline: look up tool → execute against the shared session (with timeout) → log outcome.
//! Failures never escape as errors: they become the user-facing output text.

use anyhow::Result;
use portainer_gateway::SessionManager;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use crate::registry::Registry;

/// Result of one tool call
#[derive(Debug, Clone)]
pub struct ToolOutcome {
    pub success: bool,
    pub output: String,
    pub execution_id: String,
    pub duration_ms: u64,
}

/// Executes tools against a shared Portainer session
pub struct ToolExecutor {
    session: Arc<SessionManager>,
    registry: Registry,
}

impl ToolExecutor {
    pub fn new(session: Arc<SessionManager>, registry: Registry) -> Self {
        Self { session, registry }
    }

    /// Execute a tool by name with JSON arguments
    pub async fn execute(&self, tool_name: &str, input: &[u8]) -> ToolOutcome {
        let execution_id = Uuid::new_v4().to_string();
        let start = Instant::now();

        let outcome = |success: bool, output: String| ToolOutcome {
            success,
            output,
            execution_id: execution_id.clone(),
            duration_ms: start.elapsed().as_millis() as u64,
        };

        // 1. Validate: check tool exists
        let Some(tool_def) = self.registry.get_tool(tool_name) else {
            warn!("Unknown tool requested: {tool_name}");
            return outcome(false, format!("Unknown tool: {tool_name}"));
        };

        info!(
            "Executing: id={} tool={} risk={}",
            execution_id, tool_name, tool_def.risk_level
        );

        // 2. Execute; an abandoned call cannot leave a half-written session behind
        let timeout = Duration::from_millis(tool_def.timeout_ms);
        let result = match tokio::time::timeout(timeout, self.dispatch(tool_name, input)).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!(
                "{tool_name} timed out after {}s",
                timeout.as_secs()
            )),
        };

        // 3. Log outcome
        let result = match result {
            Ok(output) => outcome(true, output),
            Err(e) => {
                warn!("Tool {tool_name} failed: {e:#}");
                outcome(false, format!("{e:#}"))
            }
        };
        info!(
            "Finished: id={} tool={} success={} duration={}ms",
            result.execution_id, tool_name, result.success, result.duration_ms
        );
        result
    }

    async fn dispatch(&self, tool_name: &str, input: &[u8]) -> Result<String> {
        let session = self.session.as_ref();
        match tool_name {
            "portainer.test" => crate::health::execute(session, input).await,
            "endpoint.list" => crate::endpoint::list::execute(session, input).await,
            "container.list" => crate::container::list::execute(session, input).await,
            "container.start" => crate::container::start::execute(session, input).await,
            "container.stop" => crate::container::stop::execute(session, input).await,
            "container.logs" => crate::container::logs::execute(session, input).await,
            "image.pull" => crate::image::pull::execute(session, input).await,
            _ => anyhow::bail!("No handler registered for tool: {tool_name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::make_tool;
    use crate::test_util::{logged_in, session};
    use portainer_gateway::HttpResponse;

    fn executor(transport: &Arc<portainer_gateway::testing::ScriptedTransport>) -> ToolExecutor {
        ToolExecutor::new(Arc::new(session(transport)), crate::build_registry())
    }

    #[test]
    fn test_every_registered_tool_has_a_handler() {
        let registry = crate::build_registry();
        let names: Vec<_> = registry.list_tools("").iter().map(|t| t.name.clone()).collect();
        assert_eq!(
            names,
            vec![
                "container.list",
                "container.logs",
                "container.start",
                "container.stop",
                "endpoint.list",
                "image.pull",
                "portainer.test",
            ]
        );
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let transport = logged_in();
        let outcome = executor(&transport).execute("fs.read", b"{}").await;
        assert!(!outcome.success);
        assert_eq!(outcome.output, "Unknown tool: fs.read");
        assert_eq!(transport.total(), 0);
    }

    #[tokio::test]
    async fn test_registered_tool_without_handler() {
        let transport = logged_in();
        let mut registry = Registry::new();
        registry.register_tool(make_tool("container.exec", "container", "d", vec![], "high", false, 1000));
        let exec = ToolExecutor::new(Arc::new(session(&transport)), registry);

        let outcome = exec.execute("container.exec", b"{}").await;
        assert!(!outcome.success);
        assert!(outcome.output.contains("No handler registered"));
    }

    #[tokio::test]
    async fn test_success_outcome() {
        let transport = logged_in();
        transport.push(
            "POST /api/endpoints/12/docker/containers/web/start",
            HttpResponse::new(204),
        );

        let outcome = executor(&transport)
            .execute("container.start", br#"{"container": "web"}"#)
            .await;
        assert!(outcome.success);
        assert_eq!(outcome.output, "Container web started");
        assert!(Uuid::parse_str(&outcome.execution_id).is_ok());
    }

    #[tokio::test]
    async fn test_failure_becomes_text() {
        let transport = logged_in();
        let outcome = executor(&transport).execute("container.logs", b"not json").await;
        assert!(!outcome.success);
        assert!(outcome.output.starts_with("Invalid container.logs input"));
    }

    #[tokio::test]
    async fn test_session_is_shared_across_calls() {
        let transport = logged_in();
        transport.always(
            "GET /api/endpoints/12/docker/containers/json",
            HttpResponse::new(200).with_json(&serde_json::json!([])),
        );
        let exec = executor(&transport);

        for _ in 0..3 {
            let outcome = exec.execute("container.list", b"{}").await;
            assert!(outcome.success, "{}", outcome.output);
        }
        assert_eq!(transport.count("POST /api/auth"), 1);
    }
}
