//! container.stop: Stop a container

use anyhow::Result;
use portainer_gateway::SessionManager;

use super::{run_lifecycle, Lifecycle};

pub async fn execute(session: &SessionManager, input: &[u8]) -> Result<String> {
    run_lifecycle(
        session,
        input,
        Lifecycle {
            tool: "container.stop",
            action: "stop",
            done: "stopped",
            unchanged: "is already stopped",
        },
    )
    .await
}
