//! container.list: List all containers of an environment

use anyhow::{Context, Result};
use portainer_gateway::{EndpointId, HttpRequest, SessionManager};
use serde::Deserialize;

use crate::api;

#[derive(Deserialize)]
struct ListInput {
    #[serde(default, deserialize_with = "api::endpoint_id")]
    endpoint_id: Option<EndpointId>,
}

/// Subset of Docker's container summary
#[derive(Deserialize)]
struct ContainerSummary {
    #[serde(rename = "Id", default)]
    id: String,
    #[serde(rename = "Names", default)]
    names: Vec<String>,
    #[serde(rename = "Image", default)]
    image: Option<String>,
    #[serde(rename = "State", default)]
    state: Option<String>,
    #[serde(rename = "Status", default)]
    status: Option<String>,
}

impl ContainerSummary {
    fn display_name(&self) -> &str {
        self.names
            .first()
            .map(|n| n.trim_start_matches('/'))
            .filter(|n| !n.is_empty())
            .unwrap_or("unnamed")
    }

    fn short_id(&self) -> &str {
        self.id.get(..12).unwrap_or(&self.id)
    }

    fn render(&self) -> String {
        format!(
            "{} (ID: {}): state {}, image {}, status {}",
            self.display_name(),
            self.short_id(),
            self.state.as_deref().unwrap_or("unknown"),
            self.image.as_deref().unwrap_or("unknown"),
            self.status.as_deref().unwrap_or("unknown"),
        )
    }
}

pub async fn execute(session: &SessionManager, input: &[u8]) -> Result<String> {
    let req: ListInput = api::parse_input(input, "container.list")?;

    let endpoint = session
        .resolve_endpoint(req.endpoint_id)
        .await
        .context("Failed to list containers")?;

    let request = HttpRequest::get(api::docker_path(endpoint, "containers/json")).query("all", "true");
    let response = session
        .send_authorized(request)
        .await
        .context("Failed to list containers")?;

    if response.status != 200 {
        return Err(api::api_error(&response)).context("Failed to list containers");
    }

    let containers: Vec<ContainerSummary> = response
        .json()
        .context("Failed to list containers: unexpected response")?;
    if containers.is_empty() {
        return Ok("No containers found".to_string());
    }

    Ok(containers
        .iter()
        .map(ContainerSummary::render)
        .collect::<Vec<_>>()
        .join("\n"))
}
