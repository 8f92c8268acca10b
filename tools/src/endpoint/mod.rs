//! Environment tools

pub mod list;

use crate::registry::{make_tool, Registry};

/// Register every environment tool with the registry.
pub fn register_tools(reg: &mut Registry) {
    reg.register_tool(make_tool(
        "endpoint.list",
        "endpoint",
        "List the Portainer environments (nodes) with ID, name, URL and GPU",
        vec![],
        "low",
        true,
        15000,
    ));
}
