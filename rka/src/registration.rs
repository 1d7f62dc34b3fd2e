use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::beacon::BeaconClient;

/// Keeps the worker registered with the scheduler for the life of the agent.
///
/// The tunnel is maintained exactly once per process; there is no reconnect
/// at this layer. A collapsed tunnel is fatal to the whole agent.
pub struct RegistrationRunner {
    client: Arc<dyn BeaconClient>,
}

impl RegistrationRunner {
    pub fn new(client: Arc<dyn BeaconClient>) -> Self {
        Self { client }
    }

    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        info!("registering worker with the scheduler");
        self.client
            .maintain_tunnel(cancel)
            .await
            .context("beacon registration failed")
    }
}
