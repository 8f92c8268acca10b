//! Tool Registry: stores and retrieves tool definitions

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

/// One argument a tool accepts
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub required: bool,
    pub description: String,
}

/// Tool metadata exposed to callers
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub namespace: String,
    pub description: String,
    pub parameters: Vec<ToolParameter>,
    pub risk_level: String,
    pub requires_confirmation: bool,
    pub idempotent: bool,
    pub timeout_ms: u64,
}

/// In-memory tool registry, ordered by name
pub struct Registry {
    tools: BTreeMap<String, ToolDefinition>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            tools: BTreeMap::new(),
        }
    }

    /// Register a tool definition
    pub fn register_tool(&mut self, tool: ToolDefinition) {
        info!("Registered tool: {} (ns: {})", tool.name, tool.namespace);
        self.tools.insert(tool.name.clone(), tool);
    }

    /// Get a tool by name
    pub fn get_tool(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    /// List tools, optionally filtered by namespace
    pub fn list_tools(&self, namespace: &str) -> Vec<&ToolDefinition> {
        self.tools
            .values()
            .filter(|t| namespace.is_empty() || t.namespace == namespace)
            .collect()
    }

    /// Get total tool count
    pub fn tool_count(&self) -> usize {
        self.tools.len()
    }
}

/// Helper to declare a tool parameter
pub fn param(name: &str, kind: &str, required: bool, description: &str) -> ToolParameter {
    ToolParameter {
        name: name.to_string(),
        kind: kind.to_string(),
        required,
        description: description.to_string(),
    }
}

/// Optional `endpoint_id` parameter shared by every environment-scoped tool
pub fn endpoint_param() -> ToolParameter {
    param(
        "endpoint_id",
        "string",
        false,
        "Environment ID; defaults to the first environment Portainer reports",
    )
}

/// Helper to create a ToolDefinition
pub fn make_tool(
    name: &str,
    namespace: &str,
    description: &str,
    parameters: Vec<ToolParameter>,
    risk_level: &str,
    idempotent: bool,
    timeout_ms: u64,
) -> ToolDefinition {
    ToolDefinition {
        name: name.to_string(),
        namespace: namespace.to_string(),
        description: description.to_string(),
        parameters,
        risk_level: risk_level.to_string(),
        requires_confirmation: risk_level == "critical",
        idempotent,
        timeout_ms,
    }
}
