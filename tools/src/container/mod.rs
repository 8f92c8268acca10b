//! Container tools (via Portainer's Docker API proxy)

pub mod list;
pub mod logs;
pub mod start;
pub mod stop;

use anyhow::{Context, Result};
use portainer_gateway::{HttpRequest, SessionManager};
use serde::Deserialize;
use tracing::info;

use crate::api;
use crate::registry::{endpoint_param, make_tool, param, Registry};

/// Register every container tool with the registry.
pub fn register_tools(reg: &mut Registry) {
    reg.register_tool(make_tool(
        "container.list",
        "container",
        "List all containers of an environment with state, image and status",
        vec![endpoint_param()],
        "low",
        true,
        15000,
    ));

    reg.register_tool(make_tool(
        "container.start",
        "container",
        "Start a stopped container",
        vec![
            param("container", "string", true, "Container ID or name"),
            endpoint_param(),
        ],
        "medium",
        true,
        30000,
    ));

    reg.register_tool(make_tool(
        "container.stop",
        "container",
        "Stop a running container",
        vec![
            param("container", "string", true, "Container ID or name"),
            endpoint_param(),
        ],
        "medium",
        true,
        30000,
    ));

    reg.register_tool(make_tool(
        "container.logs",
        "container",
        "Get the most recent stdout/stderr lines of a container",
        vec![
            param("container", "string", true, "Container ID or name"),
            endpoint_param(),
            param("tail", "integer", false, "Number of lines to return (default 100)"),
        ],
        "low",
        true,
        30000,
    ));
}

#[derive(Deserialize)]
struct LifecycleInput {
    container: String,
    #[serde(default, deserialize_with = "api::endpoint_id")]
    endpoint_id: Option<portainer_gateway::EndpointId>,
}

/// Start/stop share one shape: 204 done, 304 already in the requested state
struct Lifecycle {
    tool: &'static str,
    action: &'static str,
    done: &'static str,
    unchanged: &'static str,
}

async fn run_lifecycle(session: &SessionManager, input: &[u8], op: Lifecycle) -> Result<String> {
    let req: LifecycleInput = api::parse_input(input, op.tool)?;
    let container = req.container.trim();
    let segment = api::path_segment(container, "container")
        .with_context(|| format!("Invalid {} input", op.tool))?;

    let endpoint = session
        .resolve_endpoint(req.endpoint_id)
        .await
        .with_context(|| format!("Failed to {} container {container}", op.action))?;

    let path = api::docker_path(endpoint, &format!("containers/{segment}/{}", op.action));
    let response = session
        .send_authorized(HttpRequest::post(path))
        .await
        .with_context(|| format!("Failed to {} container {container}", op.action))?;

    match response.status {
        204 => {
            info!("Container {container} {} on environment {endpoint}", op.done);
            Ok(format!("Container {container} {}", op.done))
        }
        304 => Ok(format!("Container {container} {}", op.unchanged)),
        _ => Err(api::api_error(&response))
            .with_context(|| format!("Failed to {} container {container}", op.action)),
    }
}
