//! endpoint.list: List Portainer environments

use anyhow::{Context, Result};
use portainer_gateway::{Endpoint, HttpRequest, SessionManager};

use crate::api;

fn render(endpoint: &Endpoint) -> String {
    let name = if endpoint.name.is_empty() { "unknown" } else { endpoint.name.as_str() };
    let url = if endpoint.url.is_empty() { "unknown" } else { endpoint.url.as_str() };
    let gpu = endpoint
        .first_gpu()
        .map(|g| format!(", GPU: {}", g.name))
        .unwrap_or_default();
    format!("ID: {}, Name: {name}, URL: {url}{gpu}", endpoint.id)
}

pub async fn execute(session: &SessionManager, input: &[u8]) -> Result<String> {
    let _: serde_json::Value = api::parse_input(input, "endpoint.list")?;

    let response = session
        .send_authorized(HttpRequest::get(portainer_gateway::session::ENDPOINTS_PATH))
        .await
        .context("Failed to list environments")?;

    if response.status != 200 {
        return Err(api::api_error(&response)).context("Failed to list environments");
    }

    let endpoints: Vec<Endpoint> = response
        .json()
        .context("Failed to list environments: unexpected response")?;
    if endpoints.is_empty() {
        return Ok("No endpoints available".to_string());
    }

    Ok(endpoints.iter().map(render).collect::<Vec<_>>().join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{logged_in, session};
    use portainer_gateway::HttpResponse;
    use serde_json::json;

    #[tokio::test]
    async fn test_list_endpoints() {
        let transport = logged_in();
        transport.push(
            "GET /api/endpoints",
            HttpResponse::new(200).with_json(&json!([
                {"Id": 12, "Name": "local", "URL": "unix:///var/run/docker.sock", "Gpus": []},
                {"Id": 3, "Name": "gpu-box", "URL": "tcp://10.0.0.9:9001",
                 "Gpus": [{"name": "RTX 4090", "value": "all"}]},
                {"Id": 4}
            ])),
        );

        let out = execute(&session(&transport), b"").await.unwrap();
        assert_eq!(
            out,
            "ID: 12, Name: local, URL: unix:///var/run/docker.sock\n\
             ID: 3, Name: gpu-box, URL: tcp://10.0.0.9:9001, GPU: RTX 4090\n\
             ID: 4, Name: unknown, URL: unknown"
        );
        // one list call validates the login, one serves the tool
        assert_eq!(transport.count("GET /api/endpoints"), 2);
    }

    #[tokio::test]
    async fn test_list_endpoints_empty() {
        let transport = logged_in();
        transport.push("GET /api/endpoints", HttpResponse::new(200).with_json(&json!([])));

        let out = execute(&session(&transport), b"").await.unwrap();
        assert_eq!(out, "No endpoints available");
    }

    #[tokio::test]
    async fn test_list_endpoints_forbidden() {
        let transport = logged_in();
        transport.push("GET /api/endpoints", HttpResponse::new(403));

        let err = execute(&session(&transport), b"").await.unwrap_err();
        assert!(format!("{err:#}").contains("Failed to list environments: API error 403"));
    }
}
