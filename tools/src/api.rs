//! Helpers shared by the Portainer-backed tools

use anyhow::{Context, Result};
use portainer_gateway::{EndpointId, GatewayError, HttpResponse};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};

/// A JSON number or the same number written as a string
#[derive(Deserialize)]
#[serde(untagged)]
enum Raw {
    Number(u64),
    Text(String),
}

/// Accepts `12`, `"12"`, `""` or `null` for an optional environment id
pub fn endpoint_id<'de, D>(deserializer: D) -> Result<Option<EndpointId>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => Ok(Some(EndpointId(n))),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid endpoint id {s:?}"))),
    }
}

/// Parse tool arguments; empty input means `{}`
pub fn parse_input<T: DeserializeOwned>(input: &[u8], tool: &str) -> Result<T> {
    let input = if input.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        input
    };
    serde_json::from_slice(input).with_context(|| format!("Invalid {tool} input"))
}

/// Percent-encode a user-supplied value as exactly one path segment
pub fn path_segment(value: &str, what: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        anyhow::bail!("{what} must not be empty");
    }
    if value == "." || value == ".." {
        anyhow::bail!("{what} {value:?} is not a valid name");
    }
    Ok(urlencoding::encode(value).into_owned())
}

/// Accepts `50`, `"50"`, `""` or `null` for an optional line count
pub fn line_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(n)) => u32::try_from(n)
            .map(Some)
            .map_err(|_| D::Error::custom(format!("line count {n} is too large"))),
        Some(Raw::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Raw::Text(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid line count {s:?}"))),
    }
}

/// Path under the Docker API proxy of one environment
pub fn docker_path(endpoint: EndpointId, rest: &str) -> String {
    format!("/api/endpoints/{endpoint}/docker/{}", rest.trim_start_matches('/'))
}

/// Turn a non-success response into an API error carrying status and body
pub fn api_error(response: &HttpResponse) -> GatewayError {
    let body = response.text();
    GatewayError::Api {
        status: response.status,
        body: if body.trim().is_empty() {
            "Unknown error".to_string()
        } else {
            body.trim().to_string()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Args {
        #[serde(default, deserialize_with = "endpoint_id")]
        endpoint_id: Option<EndpointId>,
    }

    #[test]
    fn test_endpoint_id_forms() {
        let a: Args = parse_input(br#"{"endpoint_id": 12}"#, "t").unwrap();
        assert_eq!(a.endpoint_id, Some(EndpointId(12)));
        let a: Args = parse_input(br#"{"endpoint_id": "7"}"#, "t").unwrap();
        assert_eq!(a.endpoint_id, Some(EndpointId(7)));
        let a: Args = parse_input(br#"{"endpoint_id": ""}"#, "t").unwrap();
        assert_eq!(a.endpoint_id, None);
        let a: Args = parse_input(br#"{"endpoint_id": null}"#, "t").unwrap();
        assert_eq!(a.endpoint_id, None);
        let a: Args = parse_input(b"", "t").unwrap();
        assert_eq!(a.endpoint_id, None);
    }

    #[test]
    fn test_endpoint_id_rejects_names() {
        let err = parse_input::<Args>(br#"{"endpoint_id": "local"}"#, "container.list")
            .err()
            .unwrap();
        assert!(format!("{err:#}").contains("Invalid container.list input"));
    }

    #[test]
    fn test_path_segment_encodes_separators() {
        assert_eq!(path_segment("web", "container").unwrap(), "web");
        assert_eq!(path_segment("a/b", "container").unwrap(), "a%2Fb");
        assert_eq!(path_segment("my app?x", "container").unwrap(), "my%20app%3Fx");
        assert_eq!(path_segment("../users", "container").unwrap(), "..%2Fusers");
    }

    #[test]
    fn test_path_segment_rejects_dot_names() {
        for bad in ["", "  ", ".", ".."] {
            assert!(path_segment(bad, "container").is_err(), "{bad:?}");
        }
    }

    #[derive(Deserialize)]
    struct Lines {
        #[serde(default, deserialize_with = "line_count")]
        tail: Option<u32>,
    }

    #[test]
    fn test_line_count_forms() {
        let l: Lines = parse_input(br#"{"tail": 50}"#, "t").unwrap();
        assert_eq!(l.tail, Some(50));
        let l: Lines = parse_input(br#"{"tail": "50"}"#, "t").unwrap();
        assert_eq!(l.tail, Some(50));
        let l: Lines = parse_input(br#"{"tail": ""}"#, "t").unwrap();
        assert_eq!(l.tail, None);
        let l: Lines = parse_input(b"{}", "t").unwrap();
        assert_eq!(l.tail, None);
        assert!(parse_input::<Lines>(br#"{"tail": "all"}"#, "t").is_err());
        assert!(parse_input::<Lines>(br#"{"tail": 5000000000}"#, "t").is_err());
    }

    #[test]
    fn test_docker_path() {
        assert_eq!(
            docker_path(EndpointId(3), "containers/json"),
            "/api/endpoints/3/docker/containers/json"
        );
    }

    #[test]
    fn test_api_error_defaults_body() {
        match api_error(&HttpResponse::new(500)) {
            GatewayError::Api { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "Unknown error");
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
