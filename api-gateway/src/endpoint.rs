//! Portainer environment ("endpoint") model

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Numeric identifier Portainer assigns to an environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct EndpointId(pub u64);

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EndpointId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(EndpointId)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Gpu {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// Read-only view of one entry of `GET /api/endpoints`
#[derive(Debug, Clone, Deserialize)]
pub struct Endpoint {
    #[serde(rename = "Id")]
    pub id: EndpointId,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "URL", default)]
    pub url: String,
    #[serde(rename = "Gpus", default)]
    pub gpus: Option<Vec<Gpu>>,
}

impl Endpoint {
    pub fn first_gpu(&self) -> Option<&Gpu> {
        self.gpus.as_deref().and_then(|gpus| gpus.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_endpoint_list() {
        let body = json!([
            {"Id": 12, "Name": "local", "URL": "unix:///var/run/docker.sock", "Gpus": []},
            {"Id": 3, "Name": "gpu-node", "URL": "tcp://10.0.0.9:9001",
             "Gpus": [{"name": "RTX 4090", "value": "all"}], "Type": 2},
            {"Id": 7}
        ]);
        let endpoints: Vec<Endpoint> = serde_json::from_value(body).unwrap();

        assert_eq!(endpoints.len(), 3);
        assert_eq!(endpoints[0].id, EndpointId(12));
        assert!(endpoints[0].first_gpu().is_none());
        assert_eq!(endpoints[1].first_gpu().unwrap().name, "RTX 4090");
        assert!(endpoints[2].name.is_empty());
        assert!(endpoints[2].gpus.is_none());
    }

    #[test]
    fn test_endpoint_id_from_str() {
        assert_eq!(" 12 ".parse::<EndpointId>().unwrap(), EndpointId(12));
        assert!("local".parse::<EndpointId>().is_err());
        assert!("-1".parse::<EndpointId>().is_err());
        assert_eq!(EndpointId(5).to_string(), "5");
    }
}
