//! Portainer container tools
//!
//! Runs one tool call against a Portainer server and prints the result.
//! All calls go through the execution pipeline:
//! look up tool → ensure session → execute → log.
//!
//! Usage:
//!   portainer-tools                      test the connection
//!   portainer-tools list                 print the tool catalog as JSON
//!   portainer-tools <tool> [json-args]   run one tool

use anyhow::{Context, Result};
use portainer_gateway::config::LoggingConfig;
use portainer_gateway::{load_config, ConfigSource, ReqwestTransport, SessionManager};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod api;
mod container;
mod endpoint;
mod executor;
mod health;
mod image;
mod registry;
#[cfg(test)]
mod test_util;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<bool> {
    let config = load_config().context("Failed to load configuration")?;
    init_logging(&config.logging)?;
    match &config.source {
        ConfigSource::File(path) => info!("Loaded configuration from {}", path.display()),
        ConfigSource::Missing(path) => {
            warn!("Config file not found at {}, using defaults", path.display())
        }
        ConfigSource::Defaults => {}
    }

    let registry = build_registry();
    let mut args = std::env::args().skip(1);
    let tool_name = args.next().unwrap_or_else(|| "portainer.test".to_string());

    if tool_name == "list" {
        let catalog = serde_json::to_string_pretty(&registry.list_tools(""))?;
        println!("{catalog}");
        return Ok(true);
    }
    let input = args.next().unwrap_or_default();

    let connection = config
        .portainer
        .connection()
        .context("Invalid Portainer connection settings")?;
    info!("Portainer tools starting against {}", connection.base_url);

    let transport = ReqwestTransport::new(&connection).context("Failed to build HTTP client")?;
    let session = Arc::new(SessionManager::new(connection, Arc::new(transport)));
    let executor = executor::ToolExecutor::new(session, registry);

    let outcome = executor.execute(&tool_name, input.as_bytes()).await;
    if outcome.success {
        println!("{}", outcome.output);
    } else {
        eprintln!("{}", outcome.output);
    }
    Ok(outcome.success)
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log level")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr);

    let result = if logging.json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {e}"))
}

/// Build the registry with all built-in tools
pub(crate) fn build_registry() -> registry::Registry {
    let mut reg = registry::Registry::new();
    register_builtin_tools(&mut reg);
    reg
}

/// Register all built-in Portainer tools
fn register_builtin_tools(reg: &mut registry::Registry) {
    // Connection check
    health::register_tools(reg);
    // Environment tools
    endpoint::register_tools(reg);
    // Container tools
    container::register_tools(reg);
    // Image tools
    image::register_tools(reg);

    info!("Registered {} built-in tools", reg.tool_count());
}
