//! container.logs: Get container logs

use anyhow::{Context, Result};
use portainer_gateway::{EndpointId, HttpRequest, SessionManager};
use serde::Deserialize;

use crate::api;

#[derive(Deserialize)]
struct LogsInput {
    container: String,
    #[serde(default, deserialize_with = "api::endpoint_id")]
    endpoint_id: Option<EndpointId>,
    #[serde(default, deserialize_with = "api::line_count")]
    tail: Option<u32>,
}

const DEFAULT_TAIL: u32 = 100;

/// Strip Docker's 8-byte stream frame headers (non-TTY containers).
///
/// Returns `None` when the body is not a well-formed frame sequence, which is
/// the case for TTY containers whose logs arrive as raw bytes.
fn demultiplex(body: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(body.len());
    let mut rest = body;
    while !rest.is_empty() {
        if rest.len() < 8 || rest[0] > 2 || rest[1..4] != [0, 0, 0] {
            return None;
        }
        let size = u32::from_be_bytes([rest[4], rest[5], rest[6], rest[7]]) as usize;
        let frame = rest.get(8..8 + size)?;
        out.extend_from_slice(frame);
        rest = &rest[8 + size..];
    }
    Some(out)
}

fn decode_logs(body: &[u8]) -> String {
    match demultiplex(body) {
        Some(plain) => String::from_utf8_lossy(&plain).into_owned(),
        None => String::from_utf8_lossy(body).into_owned(),
    }
}

pub async fn execute(session: &SessionManager, input: &[u8]) -> Result<String> {
    let req: LogsInput = api::parse_input(input, "container.logs")?;
    let container = req.container.trim();
    let segment =
        api::path_segment(container, "container").context("Invalid container.logs input")?;

    let endpoint = session
        .resolve_endpoint(req.endpoint_id)
        .await
        .with_context(|| format!("Failed to get logs of container {container}"))?;

    let request = HttpRequest::get(api::docker_path(endpoint, &format!("containers/{segment}/logs")))
        .query("stdout", "1")
        .query("stderr", "1")
        .query("tail", req.tail.unwrap_or(DEFAULT_TAIL).to_string());
    let response = session
        .send_authorized(request)
        .await
        .with_context(|| format!("Failed to get logs of container {container}"))?;

    if response.status != 200 {
        return Err(api::api_error(&response))
            .with_context(|| format!("Failed to get logs of container {container}"));
    }

    let logs = decode_logs(response.body());
    if logs.trim().is_empty() {
        return Ok(format!("No log output for container {container}"));
    }
    Ok(logs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{logged_in, session};
    use portainer_gateway::HttpResponse;

    const LOGS: &str = "GET /api/endpoints/12/docker/containers/web/logs";

    fn frame(stream: u8, payload: &str) -> Vec<u8> {
        let mut out = vec![stream, 0, 0, 0];
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload.as_bytes());
        out
    }

    #[test]
    fn test_demultiplex_frames() {
        let mut body = frame(1, "hello\n");
        body.extend(frame(2, "oops\n"));
        assert_eq!(decode_logs(&body), "hello\noops\n");
    }

    #[test]
    fn test_raw_tty_output_passes_through() {
        assert_eq!(decode_logs(b"plain line\n"), "plain line\n");
    }

    #[test]
    fn test_truncated_frame_is_treated_as_raw() {
        let mut body = frame(1, "hello\n");
        body.truncate(10);
        assert!(demultiplex(&body).is_none());
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut body = frame(1, "ok ");
        body[7] += 1;
        body.push(0xff);
        assert_eq!(decode_logs(&body), "ok \u{fffd}");
    }

    #[tokio::test]
    async fn test_logs_request_and_output() {
        let transport = logged_in();
        transport.push(LOGS, HttpResponse::new(200).with_body(frame(1, "started\n")));

        let out = execute(&session(&transport), br#"{"container": "web", "tail": 20}"#)
            .await
            .unwrap();
        assert_eq!(out, "started\n");

        let call = transport
            .requests()
            .into_iter()
            .find(|r| r.path.ends_with("/logs"))
            .unwrap();
        assert_eq!(call.query_value("stdout"), Some("1"));
        assert_eq!(call.query_value("stderr"), Some("1"));
        assert_eq!(call.query_value("tail"), Some("20"));
    }

    #[tokio::test]
    async fn test_logs_default_tail() {
        let transport = logged_in();
        transport.push(LOGS, HttpResponse::new(200).with_body("line\n"));

        execute(&session(&transport), br#"{"container": "web"}"#)
            .await
            .unwrap();
        let call = transport
            .requests()
            .into_iter()
            .find(|r| r.path.ends_with("/logs"))
            .unwrap();
        assert_eq!(call.query_value("tail"), Some("100"));
    }

    #[tokio::test]
    async fn test_logs_tail_as_string() {
        let transport = logged_in();
        transport.push(LOGS, HttpResponse::new(200).with_body("line\n"));

        execute(&session(&transport), br#"{"container": "web", "tail": "50"}"#)
            .await
            .unwrap();
        let call = transport
            .requests()
            .into_iter()
            .find(|r| r.path.ends_with("/logs"))
            .unwrap();
        assert_eq!(call.query_value("tail"), Some("50"));
    }

    #[tokio::test]
    async fn test_logs_container_is_one_segment() {
        let transport = logged_in();
        transport.push(
            "GET /api/endpoints/12/docker/containers/a%2Fb/logs",
            HttpResponse::new(200).with_body("ok\n"),
        );

        let out = execute(&session(&transport), br#"{"container": "a/b"}"#)
            .await
            .unwrap();
        assert_eq!(out, "ok\n");
    }

    #[tokio::test]
    async fn test_logs_empty() {
        let transport = logged_in();
        transport.push(LOGS, HttpResponse::new(200));

        let out = execute(&session(&transport), br#"{"container": "web"}"#)
            .await
            .unwrap();
        assert_eq!(out, "No log output for container web");
    }

    #[tokio::test]
    async fn test_logs_not_found() {
        let transport = logged_in();
        transport.push(LOGS, HttpResponse::new(404).with_body("No such container: web"));

        let err = execute(&session(&transport), br#"{"container": "web"}"#)
            .await
            .unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.starts_with("Failed to get logs of container web"));
        assert!(msg.contains("404"));
    }
}
