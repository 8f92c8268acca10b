//! container.start: Start a container

use anyhow::Result;
use portainer_gateway::SessionManager;

use super::{run_lifecycle, Lifecycle};

pub async fn execute(session: &SessionManager, input: &[u8]) -> Result<String> {
    run_lifecycle(
        session,
        input,
        Lifecycle {
            tool: "container.start",
            action: "start",
            done: "started",
            unchanged: "is already running",
        },
    )
    .await
}
