pub mod tunnel;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Settings for one channel to the scheduler's beacon endpoint.
///
/// The registration tunnel and the sweep channel each get their own instance;
/// only the tunnel's sets `keep_alive`.
#[derive(Debug, Clone)]
pub struct BeaconConfig {
    /// ip:port of the beacon endpoint
    pub addr: String,
    /// TLS server name expected from the endpoint
    pub server_name: String,
    /// Send transport keepalive probes while the channel is idle
    pub keep_alive: bool,
    pub keepalive_interval: Duration,
    pub heartbeat_interval: Duration,
    /// Dial attempts before the connection is given up on
    pub connect_retries: u32,
}

/// Client side of the scheduler's beacon protocol.
#[async_trait]
pub trait BeaconClient: Send + Sync {
    /// Register the worker and hold the tunnel open. Returns `Ok` once
    /// `cancel` fires, `Err` when the tunnel fails for any other reason.
    async fn maintain_tunnel(&self, cancel: CancellationToken) -> Result<()>;

    /// One mark and sweep round trip: the scheduler reconciles its container
    /// bookkeeping for this worker. Never touches agent state.
    async fn sweep_containers(&self) -> Result<()>;
}
