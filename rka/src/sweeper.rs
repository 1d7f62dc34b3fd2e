use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::oneshot;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::beacon::BeaconClient;

/// Periodically asks the scheduler to mark and sweep this worker's
/// containers: the scheduler reconciles its bookkeeping and destroys
/// containers it no longer considers valid.
///
/// A failed sweep is logged and retried on the next tick; only cancellation
/// ends the loop.
pub struct SweeperRunner {
    client: Arc<dyn BeaconClient>,
    interval: Duration,
    ready: oneshot::Sender<()>,
}

impl SweeperRunner {
    /// The returned receiver fires once the sweep loop is listening for
    /// ticks and cancellation.
    pub fn new(
        client: Arc<dyn BeaconClient>,
        interval: Duration,
    ) -> (Self, oneshot::Receiver<()>) {
        let (ready, ready_rx) = oneshot::channel();
        (
            Self {
                client,
                interval,
                ready,
            },
            ready_rx,
        )
    }

    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        // first sweep happens one full interval after startup
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let _ = self.ready.send(());

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("exiting from mark and sweep");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.client.sweep_containers().await {
                        error!("failed to mark and sweep containers: {e:#}");
                    }
                }
            }
        }
    }
}
