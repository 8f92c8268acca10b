//! Image tools

pub mod pull;

use crate::registry::{endpoint_param, make_tool, param, Registry};

/// Register every image tool with the registry.
pub fn register_tools(reg: &mut Registry) {
    reg.register_tool(make_tool(
        "image.pull",
        "image",
        "Pull a Docker image onto an environment (e.g. 'nginx:latest' or 'ubuntu')",
        vec![
            param("image", "string", true, "Image reference, tag defaults to 'latest'"),
            endpoint_param(),
        ],
        "medium",
        true,
        600000,
    ));
}
