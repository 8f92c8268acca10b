//! image.pull: Pull an image through the Docker API proxy

use anyhow::{Context, Result};
use portainer_gateway::{EndpointId, HttpRequest, SessionManager};
use serde::Deserialize;
use tracing::info;

use crate::api;

#[derive(Deserialize)]
struct PullInput {
    image: String,
    #[serde(default, deserialize_with = "api::endpoint_id")]
    endpoint_id: Option<EndpointId>,
}

/// Last progress message of a pull stream
#[derive(Deserialize)]
struct Progress {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Split `name[:tag]`; a `:` before the last `/` belongs to a registry port.
/// Digest references (`name@sha256:...`) are pulled whole, without a tag.
fn split_reference(image: &str) -> (&str, Option<&str>) {
    if image.contains('@') {
        return (image, None);
    }
    let name_start = image.rfind('/').map_or(0, |i| i + 1);
    match image[name_start..].rfind(':') {
        Some(i) => {
            let split = name_start + i;
            let tag = &image[split + 1..];
            if tag.is_empty() {
                (&image[..split], Some("latest"))
            } else {
                (&image[..split], Some(tag))
            }
        }
        None => (image, Some("latest")),
    }
}

pub async fn execute(session: &SessionManager, input: &[u8]) -> Result<String> {
    let req: PullInput = api::parse_input(input, "image.pull")?;
    let image = req.image.trim();
    if image.is_empty() {
        anyhow::bail!("Invalid image.pull input: image must not be empty");
    }
    let (name, tag) = split_reference(image);
    let reference = match tag {
        Some(tag) => format!("{name}:{tag}"),
        None => name.to_string(),
    };

    let endpoint = session
        .resolve_endpoint(req.endpoint_id)
        .await
        .with_context(|| format!("Failed to pull image {image}"))?;

    let mut request =
        HttpRequest::post(api::docker_path(endpoint, "images/create")).query("fromImage", name);
    if let Some(tag) = tag {
        request = request.query("tag", tag);
    }
    let response = session
        .send_authorized(request)
        .await
        .with_context(|| format!("Failed to pull image {image}"))?;

    if response.status != 200 {
        return Err(api::api_error(&response)).with_context(|| format!("Failed to pull image {image}"));
    }

    let body = response.text();
    let last_line = body.lines().map(str::trim).filter(|l| !l.is_empty()).last();
    if let Some(progress) = last_line
        .filter(|l| l.starts_with('{'))
        .and_then(|l| serde_json::from_str::<Progress>(l).ok())
    {
        if let Some(error) = progress.error {
            anyhow::bail!("Failed to pull image {image}: {error}");
        }
        if let Some(status) = progress.status {
            info!("Pulled {reference} on environment {endpoint}: {status}");
            return Ok(format!("Pull result: {status}"));
        }
    }

    Ok(format!("Image {reference} pulled"))
}
